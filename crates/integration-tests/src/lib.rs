//! In-memory forge, git-plumbing, census and issue-tracker fakes shared by
//! the scenario tests under `tests/`.
//!
//! These mirror the `RecordingForge`/`UnusedGit` style already used for
//! `review_warden_core`'s own unit tests, generalized so a scenario test
//! can drive a full `/integrate` or `/sponsor` pass against a fake git
//! backend instead of stubbing it out entirely.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use review_warden_core::ReviewWarden;
use review_warden_forge::census::{CensusInstance, CensusRepository, Role};
use review_warden_forge::errors::Error;
use review_warden_forge::git::{CommitSpec, GitPlumbing, MergeOutcome, WorkingTree};
use review_warden_forge::issues::{Issue, IssueTrackerClient, NewIssue, Resolution};
use review_warden_forge::models::{
    CheckConclusion, CheckStatus, Comment, Commit, CommitComment, Label, PullRequest,
    PullRequestState, PushOutcome, Review, ReviewState, User,
};
use review_warden_forge::ForgeClient;

/// Builds a `login` user with a throwaway id, since nothing in these
/// scenarios keys off the numeric id.
pub fn user(login: &str) -> User {
    User { id: 1, login: login.to_string() }
}

/// A comment authored by `user` with the given body.
pub fn comment(id: u64, user_login: &str, body: &str) -> Comment {
    Comment { id, user: user(user_login), body: body.to_string() }
}

/// An approving or changes-requested review at `commit_hash`.
pub fn review(user_login: &str, state: ReviewState, commit_hash: &str) -> Review {
    Review { id: 1, user: user(user_login), state, commit_hash: commit_hash.to_string(), body: None }
}

/// A minimal open pull request, ready for a scenario test to customize.
pub fn base_pr() -> PullRequest {
    PullRequest {
        number: 7,
        title: "feat: add retry budget to the poll loop".to_string(),
        body: Some("Fixes #99".to_string()),
        draft: false,
        state: PullRequestState::Open,
        source_branch: "feature/retry-budget".to_string(),
        target_branch: "main".to_string(),
        head_hash: "feature-head".to_string(),
        author: Some(user("dev")),
        labels: vec![],
        reviews: vec![],
        comments: vec![],
    }
}

/// A census with one role per `(login, project)` entry.
pub fn census_with(repo: &str, entries: Vec<(&str, Role)>) -> CensusInstance {
    CensusInstance::new(
        "rev1",
        entries.into_iter().map(|(login, role)| (login.to_string(), repo.to_string(), role)).collect(),
    )
}

/// A jcheck result that always reports success.
pub fn passing_jcheck(commit_hash: &str) -> CheckStatus {
    CheckStatus {
        conclusion: CheckConclusion::Success,
        commit_hash: commit_hash.to_string(),
        summary: "jcheck passed".to_string(),
        details: String::new(),
    }
}

/// A forge double backed entirely by in-process state: the PR, its
/// comments and labels mutate as the bot acts on them, the way the real
/// GitHub adapter's calls would be observed by a second read.
pub struct FakeForge {
    pr: Mutex<PullRequest>,
    changed_files: Mutex<Vec<String>>,
    next_comment_id: Mutex<u64>,
    branch_heads: Mutex<HashMap<String, String>>,
    closed: Mutex<bool>,
    config_toml: Mutex<Option<Vec<u8>>>,
}

impl FakeForge {
    pub fn new(pr: PullRequest, changed_files: Vec<String>) -> Self {
        let mut branch_heads = HashMap::new();
        branch_heads.insert(pr.target_branch.clone(), "target-head-0".to_string());
        Self {
            pr: Mutex::new(pr),
            changed_files: Mutex::new(changed_files),
            next_comment_id: Mutex::new(1000),
            branch_heads: Mutex::new(branch_heads),
            closed: Mutex::new(false),
            config_toml: Mutex::new(None),
        }
    }

    /// Sets the current head of `branch`, as if something else had pushed
    /// to it meanwhile.
    pub fn set_branch_head(&self, branch: &str, hash: &str) {
        self.branch_heads.lock().unwrap().insert(branch.to_string(), hash.to_string());
    }

    /// Sets the `.forge-bot/config.toml` contents `read_repo_file` serves,
    /// as if a project had checked one in.
    pub fn set_config_toml(&self, toml: &str) {
        *self.config_toml.lock().unwrap() = Some(toml.as_bytes().to_vec());
    }

    pub fn pr_snapshot(&self) -> PullRequest {
        self.pr.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }

    fn next_id(&self) -> u64 {
        let mut id = self.next_comment_id.lock().unwrap();
        *id += 1;
        *id
    }
}

#[async_trait]
impl ForgeClient for FakeForge {
    async fn list_updated_pull_requests(
        &self,
        _repo: &str,
        _since: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<PullRequest>, Error> {
        Ok(vec![self.pr.lock().unwrap().clone()])
    }

    async fn get_pull_request(&self, _repo: &str, _number: u64) -> Result<PullRequest, Error> {
        Ok(self.pr.lock().unwrap().clone())
    }

    async fn list_new_commit_comments(
        &self,
        _repo: &str,
        _since: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<(Commit, CommitComment)>, Error> {
        Ok(vec![])
    }

    async fn get_commit(&self, _repo: &str, hash: &str) -> Result<Commit, Error> {
        Ok(Commit {
            hash: hash.to_string(),
            message: "commit message".to_string(),
            author: User::default(),
            committer: User::default(),
            parents: vec![],
            commit_comments: vec![],
        })
    }

    async fn add_comment(&self, _repo: &str, _pr: u64, body: &str) -> Result<Comment, Error> {
        let id = self.next_id();
        let posted = comment(id, "review-warden[bot]", body);
        self.pr.lock().unwrap().comments.push(posted.clone());
        Ok(posted)
    }

    async fn update_comment(&self, _repo: &str, comment_id: u64, body: &str) -> Result<(), Error> {
        let mut pr = self.pr.lock().unwrap();
        if let Some(existing) = pr.comments.iter_mut().find(|c| c.id == comment_id) {
            existing.body = body.to_string();
        }
        Ok(())
    }

    async fn delete_comment(&self, _repo: &str, comment_id: u64) -> Result<(), Error> {
        self.pr.lock().unwrap().comments.retain(|c| c.id != comment_id);
        Ok(())
    }

    async fn list_comments(&self, _repo: &str, _pr: u64) -> Result<Vec<Comment>, Error> {
        Ok(self.pr.lock().unwrap().comments.clone())
    }

    async fn add_commit_comment(&self, _repo: &str, _hash: &str, body: &str) -> Result<CommitComment, Error> {
        Ok(CommitComment { id: self.next_id(), user: User::default(), body: body.to_string() })
    }

    async fn add_labels(&self, _repo: &str, _pr: u64, labels: &[String]) -> Result<(), Error> {
        let mut pr = self.pr.lock().unwrap();
        for name in labels {
            if !pr.labels.iter().any(|l| &l.name == name) {
                pr.labels.push(Label { name: name.clone() });
            }
        }
        Ok(())
    }

    async fn remove_label(&self, _repo: &str, _pr: u64, label: &str) -> Result<(), Error> {
        self.pr.lock().unwrap().labels.retain(|l| l.name != label);
        Ok(())
    }

    async fn list_labels(&self, _repo: &str, _pr: u64) -> Result<Vec<Label>, Error> {
        Ok(self.pr.lock().unwrap().labels.clone())
    }

    async fn list_reviews(&self, _repo: &str, _pr: u64) -> Result<Vec<Review>, Error> {
        Ok(self.pr.lock().unwrap().reviews.clone())
    }

    async fn update_title(&self, _repo: &str, _pr: u64, title: &str) -> Result<(), Error> {
        self.pr.lock().unwrap().title = title.to_string();
        Ok(())
    }

    async fn update_body(&self, _repo: &str, _pr: u64, body: &str) -> Result<(), Error> {
        self.pr.lock().unwrap().body = Some(body.to_string());
        Ok(())
    }

    async fn close_pull_request(&self, _repo: &str, _pr: u64) -> Result<(), Error> {
        *self.closed.lock().unwrap() = true;
        self.pr.lock().unwrap().state = PullRequestState::Closed;
        Ok(())
    }

    async fn update_check_status(
        &self,
        _repo: &str,
        _commit_hash: &str,
        _check_name: &str,
        _status: &CheckStatus,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn compare_and_set_push(
        &self,
        _repo: &str,
        branch: &str,
        expected_head: &str,
        new_head: &str,
    ) -> Result<PushOutcome, Error> {
        let mut heads = self.branch_heads.lock().unwrap();
        let actual_head = heads.get(branch).cloned().unwrap_or_default();
        if actual_head != expected_head {
            return Ok(PushOutcome::Rejected { actual_head });
        }
        heads.insert(branch.to_string(), new_head.to_string());
        Ok(PushOutcome::Accepted { new_head: new_head.to_string() })
    }

    async fn read_repo_file(&self, _repo: &str, path: &str) -> Result<Option<Vec<u8>>, Error> {
        if path == ".forge-bot/config.toml" {
            return Ok(self.config_toml.lock().unwrap().clone());
        }
        Ok(None)
    }

    async fn list_changed_files(&self, _repo: &str, _pr: u64) -> Result<Vec<String>, Error> {
        Ok(self.changed_files.lock().unwrap().clone())
    }
}

/// A census double returning a fixed snapshot.
pub struct FakeCensus {
    instance: CensusInstance,
}

impl FakeCensus {
    pub fn new(instance: CensusInstance) -> Self {
        Self { instance }
    }
}

#[async_trait]
impl CensusRepository for FakeCensus {
    async fn current(&self) -> Result<CensusInstance, Error> {
        Ok(self.instance.clone())
    }
}

/// A local, in-memory git-plumbing fake: every commit is a cons-list of
/// ancestor messages, and rebasing onto a non-conflicting target is
/// always clean, the way a scenario test wants unless it configures a
/// conflict.
pub struct FakeGit {
    /// `branch -> current head hash`.
    branches: Mutex<HashMap<String, String>>,
    /// `hash -> (message, parent hash)`.
    commits: Mutex<HashMap<String, (String, Option<String>)>>,
    conflict_on_rebase: Mutex<bool>,
    last_commit_message: Mutex<Option<String>>,
}

impl FakeGit {
    pub fn new(target_branch: &str, target_head: &str) -> Self {
        let mut branches = HashMap::new();
        branches.insert(target_branch.to_string(), target_head.to_string());
        let mut commits = HashMap::new();
        commits.insert(target_head.to_string(), ("initial commit".to_string(), None));
        Self {
            branches: Mutex::new(branches),
            commits: Mutex::new(commits),
            conflict_on_rebase: Mutex::new(false),
            last_commit_message: Mutex::new(None),
        }
    }

    /// The full message of the most recent commit made through `commit()`,
    /// trailers and all — for scenarios that assert on the composed
    /// integration commit message rather than just the landed state.
    pub fn last_commit_message(&self) -> Option<String> {
        self.last_commit_message.lock().unwrap().clone()
    }

    /// Moves a branch to a brand-new, unrelated head, simulating someone
    /// else pushing to the target while integration was in flight.
    pub fn advance_branch(&self, branch: &str, new_head: &str, message: &str) {
        let parent = self.branches.lock().unwrap().get(branch).cloned();
        self.commits.lock().unwrap().insert(new_head.to_string(), (message.to_string(), parent));
        self.branches.lock().unwrap().insert(branch.to_string(), new_head.to_string());
    }

    pub fn force_conflict(&self) {
        *self.conflict_on_rebase.lock().unwrap() = true;
    }

    pub fn branch_head(&self, branch: &str) -> Option<String> {
        self.branches.lock().unwrap().get(branch).cloned()
    }

    /// Directly seeds a commit's message and parent, bypassing `commit()`,
    /// for crash-recovery scenarios that need a specific commit to already
    /// exist on the target before the bot ever runs.
    pub fn seed_commit(&self, hash: &str, message: &str, parent: Option<&str>) {
        self.commits.lock().unwrap().insert(hash.to_string(), (message.to_string(), parent.map(str::to_string)));
    }
}

#[async_trait]
impl GitPlumbing for FakeGit {
    async fn materialize(&self, _repo: &str, rev: &str) -> Result<WorkingTree, Error> {
        let head = self.branches.lock().unwrap().get(rev).cloned().unwrap_or_else(|| rev.to_string());
        Ok(WorkingTree { path: std::path::PathBuf::from(format!("/tmp/fake-tree/{head}")), head })
    }

    async fn fetch(&self, _tree: &WorkingTree, _rev: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn rebase(&self, tree: &WorkingTree, onto: &str) -> Result<MergeOutcome, Error> {
        if *self.conflict_on_rebase.lock().unwrap() {
            return Ok(MergeOutcome::Conflict);
        }
        Ok(MergeOutcome::Clean(format!("{}-rebased-onto-{onto}", tree.head)))
    }

    async fn commit(&self, tree: &WorkingTree, spec: CommitSpec) -> Result<String, Error> {
        let hash = format!("commit-of-{}", tree.head);
        *self.last_commit_message.lock().unwrap() = Some(spec.message.clone());
        self.commits.lock().unwrap().insert(hash.clone(), (spec.message, Some(tree.head.clone())));
        Ok(hash)
    }

    async fn create_branch(&self, _repo: &str, name: &str, hash: &str) -> Result<(), Error> {
        self.branches.lock().unwrap().insert(name.to_string(), hash.to_string());
        Ok(())
    }

    async fn find_ancestor_with_message(
        &self,
        _repo: &str,
        hash: &str,
        needle: &str,
        limit: usize,
    ) -> Result<Option<String>, Error> {
        let commits = self.commits.lock().unwrap();
        let mut current = Some(hash.to_string());
        for _ in 0..limit {
            let Some(hash) = current else { break };
            let Some((message, parent)) = commits.get(&hash) else { break };
            if message.contains(needle) {
                return Ok(Some(hash.clone()));
            }
            current = parent.clone();
        }
        Ok(None)
    }

    async fn discard(&self, _tree: WorkingTree) {}
}

/// An issue tracker double backed by a fixed map of id to resolution.
pub struct FakeIssueTracker {
    issues: Mutex<HashMap<String, Issue>>,
}

impl FakeIssueTracker {
    pub fn new(issues: Vec<(&str, Resolution)>) -> Self {
        let issues = issues
            .into_iter()
            .map(|(id, resolution)| {
                (
                    id.to_string(),
                    Issue {
                        id: id.to_string(),
                        summary: "test issue".to_string(),
                        issue_type: "Bug".to_string(),
                        resolution,
                        fix_versions: vec![],
                        csr_for: vec![],
                        backported_by: vec![],
                    },
                )
            })
            .collect();
        Self { issues: Mutex::new(issues) }
    }
}

#[async_trait]
impl IssueTrackerClient for FakeIssueTracker {
    async fn lookup(&self, id: &str) -> Result<Option<Issue>, Error> {
        Ok(self.issues.lock().unwrap().get(id).cloned())
    }

    async fn create(&self, _project: &str, _issue: NewIssue) -> Result<String, Error> {
        Ok("NEW-1".to_string())
    }
}

/// Assembles a [`ReviewWarden`] over [`FakeForge`]/[`FakeCensus`]/
/// [`FakeGit`], reporting jcheck success at `head_hash`, with no issue
/// tracker, for scenarios that don't exercise the CSR gate.
pub fn warden(forge: FakeForge, census: CensusInstance, git: FakeGit, head_hash: &str) -> ReviewWarden {
    ReviewWarden::new(
        std::sync::Arc::new(forge),
        std::sync::Arc::new(FakeCensus::new(census)),
        std::sync::Arc::new(review_warden_core::jcheck::StaticJcheckFacade::new(passing_jcheck(head_hash))),
        std::sync::Arc::new(git),
        None,
    )
}

/// As [`warden`], but wired to an issue tracker for CSR-gate scenarios.
pub fn warden_with_issue_tracker(
    forge: FakeForge,
    census: CensusInstance,
    git: FakeGit,
    head_hash: &str,
    issue_tracker: FakeIssueTracker,
) -> ReviewWarden {
    ReviewWarden::new(
        std::sync::Arc::new(forge),
        std::sync::Arc::new(FakeCensus::new(census)),
        std::sync::Arc::new(review_warden_core::jcheck::StaticJcheckFacade::new(passing_jcheck(head_hash))),
        std::sync::Arc::new(git),
        Some(std::sync::Arc::new(issue_tracker)),
    )
}
