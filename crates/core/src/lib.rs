//! # `review_warden_core`
//!
//! The policy engine: the data model, command registry/parser/dispatcher
//! (C1/C2/C6), PR state machine (C5), integration/sponsor protocol (C7),
//! work-item scheduler (C8) and labeler (C9) described by the review-bot
//! specification. [`ReviewWarden`] ties these into the single
//! reconciliation pass the scheduler runs per pull request or commit.
//!
//! This crate depends only on the traits in `review_warden_forge`, never on
//! a concrete forge adapter, so the policy logic can be exercised against
//! fakes in tests.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{instrument, warn};

use review_warden_forge::census::{CensusInstance, CensusRepository, Role};
use review_warden_forge::git::{CommitSpec, GitPlumbing};
use review_warden_forge::issues::{IssueTrackerClient, Resolution};
use review_warden_forge::models::{PullRequest, Review, ReviewState, User};
use review_warden_forge::ForgeClient;

pub mod commands;
pub mod config;
pub mod errors;
pub mod integration;
pub mod jcheck;
pub mod labels;
pub mod markers;
pub mod scheduler;
pub mod state_machine;

use commands::dispatcher::{self, AuthorizationContext, DispatchTarget};
use commands::handlers::Effect;
use commands::parser;
use errors::CoreError;
use integration::RecoveryAction;
use jcheck::JcheckFacade;
use state_machine::{PrState, Reconciliation, ReconciliationInput};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

lazy_static! {
    /// A bare issue reference in a PR title or body: `PROJ-123` or `#42`.
    static ref ISSUE_REFERENCE_RE: Regex =
        Regex::new(r"\b([A-Z][A-Z0-9]{1,9}-\d+|#\d+)\b").expect("issue reference regex is valid");
}

/// The login the bot posts comments as, used to recognize its own
/// self-commands and to exclude itself from authorization checks.
const BOT_LOGIN: &str = "review-warden[bot]";

/// Hidden marker distinguishing the bot's one instructional comment from
/// any other comment it or a user has posted, so reconciliation edits it
/// in place rather than duplicating it (§3's at-most-one-prePush).
const INSTRUCTIONAL_MARKER: &str = "<!-- review-warden:instructional -->";

/// Ties the command registry, state machine, integration protocol and
/// labeler together into the per-PR reconciliation pass the scheduler's
/// `CheckWorkItem` runs.
///
/// Holds its collaborators as trait objects rather than generics: a
/// process talks to exactly one forge/census/jcheck/git-plumbing
/// implementation, and trait objects let the scheduler's worker pool hand
/// out `Arc<ReviewWarden>` without a type parameter threading through
/// every work item.
pub struct ReviewWarden {
    forge: Arc<dyn ForgeClient>,
    census: Arc<dyn CensusRepository>,
    jcheck: Arc<dyn JcheckFacade>,
    git: Arc<dyn GitPlumbing>,
    issue_tracker: Option<Arc<dyn IssueTrackerClient>>,
}

/// What a single reconciliation pass did, for callers (the scheduler, the
/// CLI's dry-run command) to log or assert against.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// The declarative surface computed and applied this pass.
    pub reconciliation: Reconciliation,
    /// How many command replies were posted this pass.
    pub replies_posted: usize,
    /// Whether this pass also ran the integration protocol.
    pub integration_attempted: bool,
}

impl ReviewWarden {
    /// Builds a bot instance over its external collaborators. `issue_tracker`
    /// is `None` when a project configures no issue tracker integration.
    pub fn new(
        forge: Arc<dyn ForgeClient>,
        census: Arc<dyn CensusRepository>,
        jcheck: Arc<dyn JcheckFacade>,
        git: Arc<dyn GitPlumbing>,
        issue_tracker: Option<Arc<dyn IssueTrackerClient>>,
    ) -> Self {
        Self { forge, census, jcheck, git, issue_tracker }
    }

    /// Runs one full reconciliation pass against a pull request: dispatches
    /// pending commands, computes the declarative surface (C5), applies it,
    /// and — if a command this pass asked for it — runs the integration
    /// protocol (C7).
    #[instrument(skip(self))]
    pub async fn check_pull_request(&self, repo: &str, pr_number: u64) -> Result<CheckOutcome, CoreError> {
        let config = config::load_config(&*self.forge, repo).await?;
        if !config.process_pr {
            return Ok(CheckOutcome {
                reconciliation: Reconciliation {
                    state: PrState::Draft,
                    desired_labels: Default::default(),
                    labels_to_add: Vec::new(),
                    labels_to_remove: Vec::new(),
                    pre_push_comment: None,
                },
                replies_posted: 0,
                integration_attempted: false,
            });
        }
        let census = self.census.current().await?;

        let mut pr = self.forge.get_pull_request(repo, pr_number).await?;
        let author_login = pr.author.as_ref().map(|u| u.login.clone()).unwrap_or_default();

        let dispatch = self.dispatch_pending_commands(repo, &pr, &author_login, &census, &config).await?;
        if dispatch.posted > 0 {
            // A dispatched command may have changed what the reconciliation
            // pass should see (a fresh `/reviewers` count, a rejection
            // reply that is itself part of the comment history it reads).
            pr = self.forge.get_pull_request(repo, pr_number).await?;
        }

        let author_role = census.role_on(&author_login, repo);
        let jcheck_status = match self.jcheck.validate(repo, &pr.head_hash).await {
            Ok(status) => Some(status),
            Err(e) if e.is_user_facing() => {
                warn!(error = %e, "jcheck did not produce a usable result this pass");
                None
            }
            Err(e) => return Err(e),
        };

        let changed_files = self.forge.list_changed_files(repo, pr_number).await?;
        let required_reviewers = required_reviewer_count(&pr, &census, repo, &author_login, &config);
        let approving_reviewers = count_approving_reviewers(&pr, config.use_stale_reviews);
        let has_issue_link = has_issue_link(&pr, &census, repo, &author_login, &config);
        let csr_required = config.enable_csr && csr_requested(&pr, &census, repo, &author_login, &config);
        let csr_satisfied = if csr_required {
            self.csr_satisfied(&pr, &census, repo, &author_login, &config).await?
        } else {
            true
        };
        let pre_push_marker = markers::latest_pre_push_marker(
            &pr.comments.iter().map(|c| c.body.clone()).collect::<Vec<_>>(),
        );

        let input = ReconciliationInput {
            pr: &pr,
            jcheck: jcheck_status.as_ref(),
            author_role,
            required_reviewers,
            approving_reviewers,
            has_issue_link,
            csr_required,
            csr_satisfied,
            changed_files: &changed_files,
            label_configuration: &config.label_configuration,
            pre_push_marker: pre_push_marker.as_ref(),
        };
        let reconciliation = state_machine::reconcile(&input);

        self.apply_reconciliation(repo, &pr, &reconciliation).await?;

        // A pre-push marker already in flight (`Integrating`) must always
        // be followed up on, crash or no crash — recovery has to be
        // reachable from the normal reconciliation entry point, not only
        // from a direct `run_integration` call. A freshly `ReadyTo*` PR
        // only proceeds if this pass's dispatch asked for it, or if a
        // prior `/integrate auto` is still in effect.
        let ready_state = matches!(reconciliation.state, PrState::ReadyToIntegrate | PrState::ReadyToSponsor);
        let integration_attempted = matches!(reconciliation.state, PrState::Integrating)
            || (ready_state
                && (dispatch.integrate_requested
                    || auto_integrate_requested(&pr, &census, repo, &author_login, &config)));
        if integration_attempted {
            self.run_integration(repo, pr_number, dispatch.pinned_hash.as_deref()).await?;
        }

        Ok(CheckOutcome { reconciliation, replies_posted: dispatch.posted, integration_attempted })
    }

    /// Computes the same declarative surface [`check_pull_request`] would
    /// apply, without dispatching commands, posting comments, changing
    /// labels, or attempting integration — for callers (the CLI's dry-run
    /// `check` command) that want to preview a reconciliation pass against
    /// a live pull request without acting on it.
    ///
    /// [`check_pull_request`]: Self::check_pull_request
    #[instrument(skip(self))]
    pub async fn plan_pull_request(&self, repo: &str, pr_number: u64) -> Result<Reconciliation, CoreError> {
        let config = config::load_config(&*self.forge, repo).await?;
        let census = self.census.current().await?;

        let pr = self.forge.get_pull_request(repo, pr_number).await?;
        let author_login = pr.author.as_ref().map(|u| u.login.clone()).unwrap_or_default();

        let author_role = census.role_on(&author_login, repo);
        let jcheck_status = match self.jcheck.validate(repo, &pr.head_hash).await {
            Ok(status) => Some(status),
            Err(e) if e.is_user_facing() => {
                warn!(error = %e, "jcheck did not produce a usable result this pass");
                None
            }
            Err(e) => return Err(e),
        };

        let changed_files = self.forge.list_changed_files(repo, pr_number).await?;
        let required_reviewers = required_reviewer_count(&pr, &census, repo, &author_login, &config);
        let approving_reviewers = count_approving_reviewers(&pr, config.use_stale_reviews);
        let has_issue_link = has_issue_link(&pr, &census, repo, &author_login, &config);
        let csr_required = config.enable_csr && csr_requested(&pr, &census, repo, &author_login, &config);
        let csr_satisfied = if csr_required {
            self.csr_satisfied(&pr, &census, repo, &author_login, &config).await?
        } else {
            true
        };
        let pre_push_marker = markers::latest_pre_push_marker(
            &pr.comments.iter().map(|c| c.body.clone()).collect::<Vec<_>>(),
        );

        let input = ReconciliationInput {
            pr: &pr,
            jcheck: jcheck_status.as_ref(),
            author_role,
            required_reviewers,
            approving_reviewers,
            has_issue_link,
            csr_required,
            csr_satisfied,
            changed_files: &changed_files,
            label_configuration: &config.label_configuration,
            pre_push_marker: pre_push_marker.as_ref(),
        };

        Ok(state_machine::reconcile(&input))
    }

    /// Runs the commit-comment dispatch path (C8's `CommitCommand` work
    /// item): every still-unhandled invocation on `commit_hash`'s comments
    /// is authorized against [`DispatchTarget::Commit`] and run.
    #[instrument(skip(self))]
    pub async fn handle_commit_comment(&self, repo: &str, commit_hash: &str) -> Result<usize, CoreError> {
        let config = config::load_config(&*self.forge, repo).await?;
        if !config.process_commit {
            return Ok(0);
        }
        let commit = self.forge.get_commit(repo, commit_hash).await?;
        let census = self.census.current().await?;
        let existing_replies: Vec<String> =
            commit.commit_comments.iter().map(|c| c.body.clone()).collect();
        let mut posted = 0;

        for (location, comment) in commit.commit_comments.iter().enumerate() {
            for invocation in parser::invocations_from_comment(&comment.user.login, location, &comment.body) {
                if config
                    .external_commit_commands
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(&invocation.command))
                {
                    continue;
                }
                let ctx = AuthorizationContext {
                    pr_author: String::new(),
                    invoker_role: effective_role(&config, &census, &invocation.user, repo),
                    is_bot_account: invocation.user == BOT_LOGIN,
                };
                let Some(result) =
                    dispatcher::dispatch(&invocation, DispatchTarget::Commit, &ctx, &existing_replies)?
                else {
                    continue;
                };
                if let Some(outcome) = &result.outcome {
                    self.apply_effect(repo, None, commit_hash, &outcome.effect).await?;
                }
                self.forge.add_commit_comment(repo, commit_hash, &result.reply).await?;
                posted += 1;
            }
        }

        Ok(posted)
    }

    async fn dispatch_pending_commands(
        &self,
        repo: &str,
        pr: &PullRequest,
        author_login: &str,
        census: &CensusInstance,
        config: &config::ApplicationDefaults,
    ) -> Result<DispatchSummary, CoreError> {
        let mut invocations = Vec::new();
        if let Some(body) = &pr.body {
            invocations.extend(parser::invocations_from_body(author_login, body));
        }
        for (location, comment) in pr.comments.iter().enumerate() {
            invocations.extend(parser::invocations_from_comment(&comment.user.login, location, &comment.body));
        }
        for (location, review) in pr.reviews.iter().enumerate() {
            if let Some(body) = &review.body {
                invocations.extend(parser::invocations_from_review(&review.user.login, location, body));
            }
        }

        let existing_replies: Vec<String> = pr.comments.iter().map(|c| c.body.clone()).collect();
        let mut summary = DispatchSummary::default();

        for invocation in &invocations {
            if config
                .external_pull_request_commands
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&invocation.command))
            {
                continue;
            }

            let ctx = AuthorizationContext {
                pr_author: author_login.to_string(),
                invoker_role: effective_role(config, census, &invocation.user, repo),
                is_bot_account: invocation.user == BOT_LOGIN,
            };

            let Some(result) =
                dispatcher::dispatch(invocation, DispatchTarget::PullRequest, &ctx, &existing_replies)?
            else {
                continue;
            };

            let mut reply = result.reply.clone();
            if invocation.command.eq_ignore_ascii_case("help") {
                reply.push_str(&format!("\n\nSee the project census: {}", config.census_link));
            }
            self.forge.add_comment(repo, pr.number, &reply).await?;
            summary.posted += 1;

            if let Some(outcome) = &result.outcome {
                self.apply_effect(repo, Some(pr.number), &pr.head_hash, &outcome.effect).await?;
                match &outcome.effect {
                    Effect::SetIntegrateMode { pinned_hash, .. } => {
                        summary.integrate_requested = true;
                        summary.pinned_hash = pinned_hash.clone();
                    }
                    Effect::RequestSponsor { pinned_hash } => {
                        summary.integrate_requested = true;
                        summary.pinned_hash = pinned_hash.clone();
                    }
                    _ => {}
                }
            }
        }

        Ok(summary)
    }

    /// Applies the handful of effects that mutate forge/git state directly
    /// rather than being recomputed from comment history on every pass
    /// (see [`required_reviewer_count`] and friends for the latter, and
    /// [`compose_commit_message`] for the contributor/issue/summary
    /// effects that are instead replayed at commit-message compose time).
    ///
    /// `pr_number` is `None` for commit-comment dispatch, where label
    /// effects don't apply (the `label` command isn't authorized outside
    /// a pull request). `commit_hash` is the hash a `/branch` or
    /// `/backport` invocation should act against — the PR's head hash, or
    /// the commit the comment was posted on.
    async fn apply_effect(
        &self,
        repo: &str,
        pr_number: Option<u64>,
        commit_hash: &str,
        effect: &Effect,
    ) -> Result<(), CoreError> {
        match effect {
            Effect::SetLabel { name, present: true } => {
                if let Some(pr_number) = pr_number {
                    self.forge.add_labels(repo, pr_number, std::slice::from_ref(name)).await?;
                }
            }
            Effect::SetLabel { name, present: false } => {
                if let Some(pr_number) = pr_number {
                    self.forge.remove_label(repo, pr_number, name).await?;
                }
            }
            Effect::CreateBranch { name } => {
                self.git.create_branch(repo, name, commit_hash).await.map_err(CoreError::from)?;
            }
            Effect::RequestBackport { repo: target_repo, branch } => {
                let branch_name = branch.clone().unwrap_or_else(|| format!("backport/{commit_hash}"));
                self.git
                    .create_branch(target_repo, &branch_name, commit_hash)
                    .await
                    .map_err(CoreError::from)?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn apply_reconciliation(
        &self,
        repo: &str,
        pr: &PullRequest,
        reconciliation: &Reconciliation,
    ) -> Result<(), CoreError> {
        if !reconciliation.labels_to_add.is_empty() {
            self.forge.add_labels(repo, pr.number, &reconciliation.labels_to_add).await?;
        }
        for label in &reconciliation.labels_to_remove {
            self.forge.remove_label(repo, pr.number, label).await?;
        }

        if let Some(comment) = &reconciliation.pre_push_comment {
            let body = format!("{comment}\n\n{INSTRUCTIONAL_MARKER}");
            let existing = pr
                .comments
                .iter()
                .find(|c| c.user.login == BOT_LOGIN && c.body.contains(INSTRUCTIONAL_MARKER));
            match existing {
                Some(existing) => self.forge.update_comment(repo, existing.id, &body).await?,
                None => {
                    self.forge.add_comment(repo, pr.number, &body).await?;
                }
            }
        }

        Ok(())
    }

    async fn csr_satisfied(
        &self,
        pr: &PullRequest,
        census: &CensusInstance,
        repo: &str,
        author_login: &str,
        config: &config::ApplicationDefaults,
    ) -> Result<bool, CoreError> {
        let Some(tracker) = &self.issue_tracker else {
            return Ok(false);
        };
        let linked_id = replay_authorized_effect(pr, census, repo, author_login, config, &["issue", "solves"])
            .into_iter()
            .rev()
            .find_map(|e| match e {
                Effect::AddIssueLink { id } => Some(id),
                _ => None,
            });
        let Some(linked_id) = linked_id else {
            return Ok(false);
        };
        match tracker.lookup(&linked_id).await? {
            Some(issue) => Ok(issue.resolution == Resolution::Fixed),
            None => Ok(false),
        }
    }

    /// Runs §4.4's atomic push-and-finalize sequence, consulting
    /// [`integration::decide_recovery`] first so a restart after a crash
    /// never re-pushes a commit that already landed.
    ///
    /// `pinned_hash` is the target-branch hash a `/integrate <hash>` or
    /// `/sponsor <hash>` invocation asked to integrate against, if any: a
    /// fresh attempt aborts rather than building a candidate once the
    /// target branch has moved past it. A recovered attempt (an existing
    /// marker) was already pinned when it was first built, so the check
    /// only applies to the no-marker path.
    #[instrument(skip(self))]
    pub async fn run_integration(
        &self,
        repo: &str,
        pr_number: u64,
        pinned_hash: Option<&str>,
    ) -> Result<(), CoreError> {
        let pr = self.forge.get_pull_request(repo, pr_number).await?;
        let comments: Vec<String> = pr.comments.iter().map(|c| c.body.clone()).collect();
        let existing_marker = markers::latest_pre_push_marker(&comments);

        let Some(marker) = existing_marker else {
            return self.build_and_push(repo, &pr, pinned_hash).await;
        };

        let target_tree = self.git.materialize(repo, &pr.target_branch).await?;
        let target_head = target_tree.head.clone();
        let digest_on_target = self
            .git
            .find_ancestor_with_message(repo, &target_head, &marker.message_digest, 200)
            .await?
            .is_some();
        self.git.discard(target_tree).await;

        match integration::decide_recovery(&marker, &target_head, digest_on_target) {
            RecoveryAction::Finalize => self.finalize_without_pushing(repo, &marker).await,
            RecoveryAction::ReusePrePush => {
                let config = config::load_config(&*self.forge, repo).await?;
                let census = self.census.current().await?;
                let author_login = pr.author.as_ref().map(|u| u.login.clone()).unwrap_or_default();
                let committer = User { id: 0, login: BOT_LOGIN.to_string() };
                let author = pr.author.clone().unwrap_or_else(|| committer.clone());
                let message = compose_commit_message(&pr, &census, repo, &author_login, &config);
                let spec = CommitSpec { message, author, committer };
                integration::push_and_finalize(&*self.forge, &*self.git, repo, &pr, &spec, marker).await?;
                Ok(())
            }
            RecoveryAction::Restart => self.build_and_push(repo, &pr, pinned_hash).await,
        }
    }

    async fn finalize_without_pushing(&self, repo: &str, marker: &markers::PrePushMarker) -> Result<(), CoreError> {
        self.forge
            .add_comment(repo, marker.pull_request_id, &integration::render_pushed_comment(&marker.candidate_hash))
            .await?;
        self.forge
            .add_labels(repo, marker.pull_request_id, &["integrated".to_string()])
            .await?;
        for label in ["ready", "rfr", "sponsor"] {
            self.forge.remove_label(repo, marker.pull_request_id, label).await?;
        }
        self.forge.close_pull_request(repo, marker.pull_request_id).await?;
        Ok(())
    }

    async fn build_and_push(
        &self,
        repo: &str,
        pr: &PullRequest,
        pinned_hash: Option<&str>,
    ) -> Result<(), CoreError> {
        let config = config::load_config(&*self.forge, repo).await?;
        let census = self.census.current().await?;
        let author_login = pr.author.as_ref().map(|u| u.login.clone()).unwrap_or_default();
        let committer = User { id: 0, login: BOT_LOGIN.to_string() };
        let author = pr.author.clone().unwrap_or_else(|| committer.clone());
        let message = compose_commit_message(pr, &census, repo, &author_login, &config);
        let spec = CommitSpec { message: message.clone(), author, committer };

        let Some((candidate_hash, target_head)) =
            integration::build_candidate(&*self.git, repo, pr, spec.clone()).await?
        else {
            self.forge
                .add_comment(
                    repo,
                    pr.number,
                    "This pull request can not be integrated; please merge the target branch.",
                )
                .await?;
            self.forge.remove_label(repo, pr.number, "ready").await?;
            return Ok(());
        };

        if let Some(pinned) = pinned_hash {
            if pinned != target_head {
                self.forge
                    .add_comment(
                        repo,
                        pr.number,
                        "The target branch is no longer at the requested hash.",
                    )
                    .await?;
                return Ok(());
            }
        }

        let marker = markers::PrePushMarker {
            pull_request_id: pr.number,
            target_branch: pr.target_branch.clone(),
            target_head,
            candidate_hash,
            message_digest: message_digest(&message),
        };
        self.forge.add_comment(repo, pr.number, &integration::render_pre_push_comment(&marker)).await?;
        integration::push_and_finalize(&*self.forge, &*self.git, repo, pr, &spec, marker).await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DispatchSummary {
    posted: usize,
    integrate_requested: bool,
    /// The target-branch hash a `/integrate <hash>` or `/sponsor <hash>`
    /// invocation pinned the attempt to, if any (§4.4's stale-target abort).
    pinned_hash: Option<String>,
}

/// Composes the integration commit message: title, an optional summary
/// paragraph, and a trailer block covering linked issues, reviewers,
/// co-authors and (for a backport) the commit it backports.
fn compose_commit_message(
    pr: &PullRequest,
    census: &CensusInstance,
    repo: &str,
    author_login: &str,
    config: &config::ApplicationDefaults,
) -> String {
    let mut sections = vec![pr.title.clone()];

    if let Some(summary) = replay_authorized_effect(pr, census, repo, author_login, config, &["summary"])
        .into_iter()
        .rev()
        .find_map(|effect| match effect {
            Effect::SetSummary(text) => Some(text),
            _ => None,
        })
    {
        sections.push(format!("Summary:\n{summary}"));
    }

    let mut trailers = Vec::new();
    for id in ordered_issue_links(pr, census, repo, author_login, config) {
        trailers.push(format!("Issue: {id}"));
    }

    let reviewers: Vec<&str> = pr
        .reviews
        .iter()
        .filter(|r| matches!(r.state, ReviewState::Approved))
        .map(|r| r.user.login.as_str())
        .collect();
    if !reviewers.is_empty() {
        trailers.push(format!("Reviewed-by: {}", reviewers.join(", ")));
    }

    for (name, email) in ordered_contributors(pr, census, repo, author_login, config) {
        trailers.push(format!("Co-authored-by: {name} <{email}>"));
    }

    if let Some(hash) = backport_source_hash(pr) {
        trailers.push(format!("Backport-of: {hash}"));
    }

    if !trailers.is_empty() {
        sections.push(trailers.join("\n"));
    }

    sections.join("\n\n")
}

fn message_digest(message: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(message.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Counts distinct reviewers whose most recent review approves the PR,
/// optionally discounting reviews left against an earlier head hash.
fn count_approving_reviewers(pr: &PullRequest, use_stale_reviews: bool) -> u8 {
    let mut latest: HashMap<&str, &Review> = HashMap::new();
    for review in &pr.reviews {
        latest.insert(review.user.login.as_str(), review);
    }
    latest
        .values()
        .filter(|r| matches!(r.state, ReviewState::Approved) && (use_stale_reviews || r.commit_hash == pr.head_hash))
        .count() as u8
}

/// Replays every comment invocation of `command_names` that the invoker was
/// authorized to issue, in comment order, and returns the effects in that
/// order. This is how the bot recovers command-driven state across
/// restarts without persisting anything of its own (§6: "Persisted state:
/// None") — it re-derives the answer from the PR's comment history on
/// every pass, the same way the state machine recomputes everything else.
fn replay_authorized_effect(
    pr: &PullRequest,
    census: &CensusInstance,
    repo: &str,
    author_login: &str,
    config: &config::ApplicationDefaults,
    command_names: &[&str],
) -> Vec<Effect> {
    let mut effects = Vec::new();
    for (location, comment) in pr.comments.iter().enumerate() {
        for invocation in parser::invocations_from_comment(&comment.user.login, location, &comment.body) {
            if !command_names.iter().any(|name| invocation.command.eq_ignore_ascii_case(name)) {
                continue;
            }
            let Some(spec) = commands::find_command(&invocation.command) else {
                continue;
            };
            let ctx = AuthorizationContext {
                pr_author: author_login.to_string(),
                invoker_role: effective_role(config, census, &invocation.user, repo),
                is_bot_account: invocation.user == BOT_LOGIN,
            };
            if dispatcher::authorize(spec, &invocation, DispatchTarget::PullRequest, &ctx).is_err() {
                continue;
            }
            if let Ok(outcome) = commands::handlers::handle(&invocation.command, &invocation.arguments) {
                effects.push(outcome.effect);
            }
        }
    }
    effects
}

/// Resolves an invoker's effective role for authorization: a login listed
/// in the repository's configured `integrators` always counts as at least
/// [`Role::Integrator`], regardless of what the census itself says — the
/// operator-level override §6 describes for bootstrapping a project before
/// its census catches up.
fn effective_role(config: &config::ApplicationDefaults, census: &CensusInstance, login: &str, repo: &str) -> Option<Role> {
    if config.integrators.iter().any(|name| name == login) {
        Some(Role::Integrator)
    } else {
        census.role_on(login, repo)
    }
}

fn required_reviewer_count(
    pr: &PullRequest,
    census: &CensusInstance,
    repo: &str,
    author_login: &str,
    config: &config::ApplicationDefaults,
) -> u8 {
    replay_authorized_effect(pr, census, repo, author_login, config, &["reviewers"])
        .into_iter()
        .rev()
        .find_map(|effect| match effect {
            Effect::SetReviewerCount { count, .. } => Some(count),
            _ => None,
        })
        .unwrap_or(1)
}

fn has_issue_link(
    pr: &PullRequest,
    census: &CensusInstance,
    repo: &str,
    author_login: &str,
    config: &config::ApplicationDefaults,
) -> bool {
    let referenced_in_content =
        ISSUE_REFERENCE_RE.is_match(&pr.title) || pr.body.as_deref().is_some_and(|b| ISSUE_REFERENCE_RE.is_match(b));
    if referenced_in_content {
        return true;
    }

    replay_authorized_effect(pr, census, repo, author_login, config, &["issue", "solves"])
        .into_iter()
        .fold(false, |linked, effect| match effect {
            Effect::AddIssueLink { .. } => true,
            Effect::RemoveIssueLink { .. } => false,
            _ => linked,
        })
}

fn csr_requested(
    pr: &PullRequest,
    census: &CensusInstance,
    repo: &str,
    author_login: &str,
    config: &config::ApplicationDefaults,
) -> bool {
    replay_authorized_effect(pr, census, repo, author_login, config, &["csr"])
        .into_iter()
        .rev()
        .find_map(|effect| match effect {
            Effect::SetCsrRequired(required) => Some(required),
            _ => None,
        })
        .unwrap_or(false)
}

/// Whether the most recent authorized `/integrate auto`/`/integrate manual`
/// left auto-integrate mode switched on: a PR in this mode integrates the
/// moment it becomes ready, without a fresh `/integrate` invocation.
fn auto_integrate_requested(
    pr: &PullRequest,
    census: &CensusInstance,
    repo: &str,
    author_login: &str,
    config: &config::ApplicationDefaults,
) -> bool {
    replay_authorized_effect(pr, census, repo, author_login, config, &["integrate"])
        .into_iter()
        .rev()
        .find_map(|effect| match effect {
            Effect::SetIntegrateMode { auto: Some(auto), .. } => Some(auto),
            _ => None,
        })
        .unwrap_or(false)
}

/// The issue ids an authorized `/issue`/`/solves` history has linked, in
/// the order they were added, with later removals taken into account.
fn ordered_issue_links(
    pr: &PullRequest,
    census: &CensusInstance,
    repo: &str,
    author_login: &str,
    config: &config::ApplicationDefaults,
) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for effect in replay_authorized_effect(pr, census, repo, author_login, config, &["issue", "solves"]) {
        match effect {
            Effect::AddIssueLink { id } => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            Effect::RemoveIssueLink { id } => ids.retain(|existing| existing != &id),
            _ => {}
        }
    }
    ids
}

/// The co-authors an authorized `/contributor add`/`/contributor remove`
/// history has accumulated, in the order they were added.
fn ordered_contributors(
    pr: &PullRequest,
    census: &CensusInstance,
    repo: &str,
    author_login: &str,
    config: &config::ApplicationDefaults,
) -> Vec<(String, String)> {
    let mut contributors: Vec<(String, String)> = Vec::new();
    for effect in replay_authorized_effect(pr, census, repo, author_login, config, &["contributor"]) {
        match effect {
            Effect::AddContributor { name, email } => {
                contributors.retain(|(existing, _)| existing != &name);
                contributors.push((name, email));
            }
            Effect::RemoveContributor { name } => contributors.retain(|(existing, _)| existing != &name),
            _ => {}
        }
    }
    contributors
}

/// The commit hash a backport PR is backporting, if its source branch
/// follows the `backport/<hash>` naming convention.
fn backport_source_hash(pr: &PullRequest) -> Option<&str> {
    pr.source_branch.strip_prefix("backport/")
}
