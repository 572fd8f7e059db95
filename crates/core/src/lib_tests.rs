use std::sync::Mutex;

use async_trait::async_trait;
use proptest::prelude::*;

use review_warden_forge::census::{CensusInstance, CensusRepository, Role};
use review_warden_forge::errors::Error;
use review_warden_forge::git::{CommitSpec, GitPlumbing, MergeOutcome, WorkingTree};
use review_warden_forge::models::{
    CheckConclusion, CheckStatus, Comment, Commit, CommitComment, Label, PullRequest,
    PullRequestState, Review, ReviewState, User,
};
use review_warden_forge::ForgeClient;

use super::*;
use crate::jcheck::StaticJcheckFacade;

fn committer(login: &str) -> User {
    User { id: 1, login: login.to_string() }
}

fn comment(user: &str, body: &str) -> Comment {
    Comment { id: 1, user: committer(user), body: body.to_string() }
}

fn review(user: &str, state: ReviewState, commit_hash: &str) -> Review {
    Review { id: 1, user: committer(user), state, commit_hash: commit_hash.to_string(), body: None }
}

fn base_pr() -> PullRequest {
    PullRequest {
        number: 42,
        title: "feat: add login".to_string(),
        body: Some("Adds the login flow".to_string()),
        draft: false,
        state: PullRequestState::Open,
        source_branch: "feature/login".to_string(),
        target_branch: "main".to_string(),
        head_hash: "abc123".to_string(),
        author: Some(committer("dev")),
        labels: vec![],
        reviews: vec![],
        comments: vec![],
    }
}

fn census_with(repo: &str, entries: Vec<(&str, Role)>) -> CensusInstance {
    CensusInstance::new(
        "rev1",
        entries
            .into_iter()
            .map(|(login, role)| (login.to_string(), repo.to_string(), role))
            .collect(),
    )
}

#[test]
fn required_reviewer_count_defaults_to_one_with_no_comments() {
    let pr = base_pr();
    let census = census_with("openjdk/jdk", vec![("dev", Role::Contributor)]);

    assert_eq!(required_reviewer_count(&pr, &census, "openjdk/jdk", "dev", &config::ApplicationDefaults::default()), 1);
}

#[test]
fn required_reviewer_count_uses_the_latest_authorized_invocation() {
    let mut pr = base_pr();
    pr.comments = vec![
        comment("lead", "/reviewers 2"),
        comment("lead", "/reviewers 3 committer"),
    ];
    let census = census_with("openjdk/jdk", vec![("lead", Role::Committer), ("dev", Role::Contributor)]);

    assert_eq!(required_reviewer_count(&pr, &census, "openjdk/jdk", "dev", &config::ApplicationDefaults::default()), 3);
}

#[test]
fn required_reviewer_count_ignores_an_unauthorized_invocation() {
    let mut pr = base_pr();
    pr.comments = vec![comment("rando", "/reviewers 4")];
    let census = census_with("openjdk/jdk", vec![("dev", Role::Contributor)]);

    assert_eq!(required_reviewer_count(&pr, &census, "openjdk/jdk", "dev", &config::ApplicationDefaults::default()), 1);
}

#[test]
fn has_issue_link_detects_a_reference_in_the_body() {
    let mut pr = base_pr();
    pr.body = Some("Fixes #42".to_string());
    let census = census_with("openjdk/jdk", vec![]);

    assert!(has_issue_link(&pr, &census, "openjdk/jdk", "dev", &config::ApplicationDefaults::default()));
}

#[test]
fn has_issue_link_tracks_link_and_unlink_commands() {
    let mut pr = base_pr();
    pr.body = Some("No reference here".to_string());
    pr.comments = vec![comment("dev", "/issue add JDK-1234")];
    let census = census_with("openjdk/jdk", vec![("dev", Role::Contributor)]);
    assert!(has_issue_link(&pr, &census, "openjdk/jdk", "dev", &config::ApplicationDefaults::default()));

    pr.comments.push(comment("dev", "/issue remove JDK-1234"));
    assert!(!has_issue_link(&pr, &census, "openjdk/jdk", "dev", &config::ApplicationDefaults::default()));
}

#[test]
fn csr_requested_defaults_to_false_and_honors_the_command() {
    let mut pr = base_pr();
    let census = census_with("openjdk/jdk", vec![("dev", Role::Contributor)]);
    assert!(!csr_requested(&pr, &census, "openjdk/jdk", "dev", &config::ApplicationDefaults::default()));

    pr.comments = vec![comment("dev", "/csr")];
    assert!(csr_requested(&pr, &census, "openjdk/jdk", "dev", &config::ApplicationDefaults::default()));

    pr.comments.push(comment("dev", "/csr unneeded"));
    assert!(!csr_requested(&pr, &census, "openjdk/jdk", "dev", &config::ApplicationDefaults::default()));
}

#[test]
fn count_approving_reviewers_keeps_only_the_latest_review_per_user() {
    let mut pr = base_pr();
    pr.reviews = vec![
        review("alice", ReviewState::ChangesRequested, "abc123"),
        review("alice", ReviewState::Approved, "abc123"),
        review("bob", ReviewState::Approved, "abc123"),
    ];

    assert_eq!(count_approving_reviewers(&pr, false), 2);
}

#[test]
fn count_approving_reviewers_discounts_stale_reviews_unless_configured_otherwise() {
    let mut pr = base_pr();
    pr.head_hash = "fresh".to_string();
    pr.reviews = vec![review("alice", ReviewState::Approved, "stale")];

    assert_eq!(count_approving_reviewers(&pr, false), 0);
    assert_eq!(count_approving_reviewers(&pr, true), 1);
}

#[derive(Default)]
struct RecordingForge {
    pr: Mutex<PullRequest>,
    changed_files: Mutex<Vec<String>>,
    added_labels: Mutex<Vec<String>>,
    removed_labels: Mutex<Vec<String>>,
    comments: Mutex<Vec<String>>,
    config_toml: Mutex<Option<String>>,
}

impl RecordingForge {
    fn new(pr: PullRequest, changed_files: Vec<String>) -> Self {
        Self {
            pr: Mutex::new(pr),
            changed_files: Mutex::new(changed_files),
            ..Default::default()
        }
    }

    fn set_config_toml(&self, toml: &str) {
        *self.config_toml.lock().unwrap() = Some(toml.to_string());
    }
}

#[async_trait]
impl ForgeClient for RecordingForge {
    async fn list_updated_pull_requests(
        &self,
        _repo: &str,
        _since: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<PullRequest>, Error> {
        Ok(vec![])
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
            message: "msg".to_string(),
            author: User::default(),
            committer: User::default(),
            parents: vec![],
            commit_comments: vec![],
        })
    }

    async fn add_comment(&self, _repo: &str, _pr: u64, body: &str) -> Result<Comment, Error> {
        self.comments.lock().unwrap().push(body.to_string());
        Ok(Comment { id: 99, user: User::default(), body: body.to_string() })
    }

    async fn update_comment(&self, _repo: &str, _comment_id: u64, body: &str) -> Result<(), Error> {
        self.comments.lock().unwrap().push(body.to_string());
        Ok(())
    }

    async fn delete_comment(&self, _repo: &str, _comment_id: u64) -> Result<(), Error> {
        Ok(())
    }

    async fn list_comments(&self, _repo: &str, _pr: u64) -> Result<Vec<Comment>, Error> {
        Ok(self.pr.lock().unwrap().comments.clone())
    }

    async fn add_commit_comment(&self, _repo: &str, _hash: &str, body: &str) -> Result<CommitComment, Error> {
        Ok(CommitComment { id: 1, user: User::default(), body: body.to_string() })
    }

    async fn add_labels(&self, _repo: &str, _pr: u64, labels: &[String]) -> Result<(), Error> {
        self.added_labels.lock().unwrap().extend(labels.iter().cloned());
        Ok(())
    }

    async fn remove_label(&self, _repo: &str, _pr: u64, label: &str) -> Result<(), Error> {
        self.removed_labels.lock().unwrap().push(label.to_string());
        Ok(())
    }

    async fn list_labels(&self, _repo: &str, _pr: u64) -> Result<Vec<Label>, Error> {
        Ok(self.pr.lock().unwrap().labels.clone())
    }

    async fn list_reviews(&self, _repo: &str, _pr: u64) -> Result<Vec<Review>, Error> {
        Ok(self.pr.lock().unwrap().reviews.clone())
    }

    async fn update_title(&self, _repo: &str, _pr: u64, _title: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn update_body(&self, _repo: &str, _pr: u64, _body: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn close_pull_request(&self, _repo: &str, _pr: u64) -> Result<(), Error> {
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
        _branch: &str,
        _expected_head: &str,
        new_head: &str,
    ) -> Result<review_warden_forge::models::PushOutcome, Error> {
        Ok(review_warden_forge::models::PushOutcome::Accepted { new_head: new_head.to_string() })
    }

    async fn read_repo_file(&self, _repo: &str, _path: &str) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.config_toml.lock().unwrap().clone().map(String::into_bytes))
    }

    async fn list_changed_files(&self, _repo: &str, _pr: u64) -> Result<Vec<String>, Error> {
        Ok(self.changed_files.lock().unwrap().clone())
    }
}

struct RecordingCensus {
    instance: CensusInstance,
}

#[async_trait]
impl CensusRepository for RecordingCensus {
    async fn current(&self) -> Result<CensusInstance, Error> {
        Ok(self.instance.clone())
    }
}

/// Never exercised by the happy-path test below (no `/integrate` is
/// issued), but [`ReviewWarden::new`] still requires a collaborator.
struct UnusedGit;

#[async_trait]
impl GitPlumbing for UnusedGit {
    async fn materialize(&self, _repo: &str, _rev: &str) -> Result<WorkingTree, Error> {
        Err(Error::NotFound("git plumbing not wired up in this test".to_string()))
    }

    async fn fetch(&self, _tree: &WorkingTree, _rev: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn rebase(&self, _tree: &WorkingTree, _onto: &str) -> Result<MergeOutcome, Error> {
        Ok(MergeOutcome::Conflict)
    }

    async fn commit(&self, _tree: &WorkingTree, _spec: CommitSpec) -> Result<String, Error> {
        Err(Error::NotFound("git plumbing not wired up in this test".to_string()))
    }

    async fn create_branch(&self, _repo: &str, _name: &str, _hash: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn find_ancestor_with_message(
        &self,
        _repo: &str,
        _hash: &str,
        _needle: &str,
        _limit: usize,
    ) -> Result<Option<String>, Error> {
        Ok(None)
    }

    async fn discard(&self, _tree: WorkingTree) {}
}

#[tokio::test]
async fn check_pull_request_marks_a_fully_satisfied_committer_authored_pr_ready() {
    let mut pr = base_pr();
    pr.body = Some("Fixes #42".to_string());
    pr.reviews = vec![review("alice", ReviewState::Approved, "abc123")];

    let forge = RecordingForge::new(pr.clone(), vec!["src/main.rs".to_string()]);
    let census = RecordingCensus {
        instance: census_with("openjdk/jdk", vec![("dev", Role::Committer), ("alice", Role::Reviewer)]),
    };
    let jcheck = StaticJcheckFacade::new(CheckStatus {
        conclusion: CheckConclusion::Success,
        commit_hash: "abc123".to_string(),
        summary: "jcheck passed".to_string(),
        details: String::new(),
    });

    let warden = ReviewWarden::new(
        Arc::new(forge),
        Arc::new(census),
        Arc::new(jcheck),
        Arc::new(UnusedGit),
        None,
    );

    let outcome = warden.check_pull_request("openjdk/jdk", 42).await.expect("reconciliation");

    assert_eq!(outcome.reconciliation.state, PrState::ReadyToIntegrate);
    assert!(outcome.reconciliation.labels_to_add.contains(&"ready".to_string()));
    assert!(outcome.reconciliation.pre_push_comment.is_some());
    assert!(!outcome.integration_attempted);
}

#[tokio::test]
async fn check_pull_request_leaves_a_draft_pr_unready() {
    let mut pr = base_pr();
    pr.draft = true;

    let forge = RecordingForge::new(pr, vec![]);
    let census = RecordingCensus { instance: census_with("openjdk/jdk", vec![("dev", Role::Committer)]) };
    let jcheck = StaticJcheckFacade::new(CheckStatus {
        conclusion: CheckConclusion::InProgress,
        commit_hash: "abc123".to_string(),
        summary: "running".to_string(),
        details: String::new(),
    });

    let warden = ReviewWarden::new(
        Arc::new(forge),
        Arc::new(census),
        Arc::new(jcheck),
        Arc::new(UnusedGit),
        None,
    );

    let outcome = warden.check_pull_request("openjdk/jdk", 42).await.expect("reconciliation");

    assert_eq!(outcome.reconciliation.state, PrState::Draft);
    assert!(outcome.reconciliation.pre_push_comment.is_none());
}

#[tokio::test]
async fn check_pull_request_honors_a_process_pr_false_override_by_skipping_entirely() {
    let pr = base_pr();
    let forge = RecordingForge::new(pr, vec![]);
    forge.set_config_toml("processPR = false");
    let census = RecordingCensus { instance: census_with("openjdk/jdk", vec![("dev", Role::Committer)]) };
    let jcheck = StaticJcheckFacade::new(CheckStatus {
        conclusion: CheckConclusion::Success,
        commit_hash: "abc123".to_string(),
        summary: "jcheck passed".to_string(),
        details: String::new(),
    });

    let warden =
        ReviewWarden::new(Arc::new(forge), Arc::new(census), Arc::new(jcheck), Arc::new(UnusedGit), None);

    let outcome = warden.check_pull_request("openjdk/jdk", 42).await.expect("reconciliation");

    assert_eq!(outcome.reconciliation.state, PrState::Draft);
    assert_eq!(outcome.replies_posted, 0);
    assert!(!outcome.integration_attempted);
}

#[tokio::test]
async fn a_configured_integrator_can_run_committer_gated_commands_without_a_census_entry() {
    let mut pr = base_pr();
    pr.comments = vec![comment("ops", "/reviewers 3")];

    let forge = Arc::new(RecordingForge::new(pr, vec![]));
    forge.set_config_toml(r#"integrators = ["ops"]"#);
    // "ops" is deliberately absent from the census: the config override
    // alone must be enough to authorize a committer-gated command.
    let census = RecordingCensus { instance: census_with("openjdk/jdk", vec![("dev", Role::Contributor)]) };
    let jcheck = StaticJcheckFacade::new(CheckStatus {
        conclusion: CheckConclusion::InProgress,
        commit_hash: "abc123".to_string(),
        summary: "running".to_string(),
        details: String::new(),
    });

    let warden =
        ReviewWarden::new(forge.clone(), Arc::new(census), Arc::new(jcheck), Arc::new(UnusedGit), None);

    let outcome = warden.check_pull_request("openjdk/jdk", 42).await.expect("reconciliation");

    assert_eq!(outcome.replies_posted, 1);
    let posted = forge.comments.lock().unwrap();
    assert!(posted[0].contains("Required reviewer count set to 3"));
}

proptest! {
    #[test]
    fn issue_reference_regex_never_panics_on_arbitrary_input(input in ".*") {
        let _ = ISSUE_REFERENCE_RE.is_match(&input);
    }
}
