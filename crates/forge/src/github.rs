//! GitHub-backed implementation of [`crate::ForgeClient`].
//!
//! This is the one concrete forge adapter this workspace ships; the issue
//! tracker, git plumbing and census repository remain trait-only (see
//! [`crate::issues`], [`crate::git`], [`crate::census`]).

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde_json::json;
use tracing::{debug, error, instrument, warn};

use crate::errors::Error;
use crate::models::{
    CheckConclusion, CheckStatus, Comment, Commit, CommitComment, Label, PullRequest,
    PullRequestState, PushOutcome, Review, ReviewState, User,
};
use crate::ForgeClient;

/// Splits a `owner/name` repository identifier into its two parts.
fn split_repo(repo: &str) -> Result<(&str, &str), Error> {
    repo.split_once('/')
        .ok_or_else(|| Error::InvalidConfig(format!("not an owner/name repository: {repo}")))
}

/// Logs detailed error information from an Octocrab error, grouped by the
/// variants Octocrab itself distinguishes.
fn log_octocrab_error(message: &str, e: octocrab::Error) {
    match e {
        octocrab::Error::GitHub { source, backtrace } => error!(
            error_message = source.message,
            backtrace = backtrace.to_string(),
            "{}. Received an error from GitHub",
            message
        ),
        octocrab::Error::UriParse { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. Failed to parse URI",
            message
        ),
        octocrab::Error::InvalidHeaderValue { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. One of the header values was invalid",
            message
        ),
        other => error!(error_message = other.to_string(), "{}", message),
    }
}

fn review_state_from(state: octocrab::models::pulls::ReviewState) -> ReviewState {
    use octocrab::models::pulls::ReviewState as Upstream;
    match state {
        Upstream::Approved => ReviewState::Approved,
        Upstream::ChangesRequested => ReviewState::ChangesRequested,
        Upstream::Dismissed => ReviewState::Dismissed,
        _ => ReviewState::Commented,
    }
}

/// GitHub implementation of [`ForgeClient`], backed by an installation- or
/// token-authenticated [`Octocrab`] client.
#[derive(Debug, Clone)]
pub struct GitHubForge {
    client: Octocrab,
}

impl GitHubForge {
    /// Wraps an already-authenticated Octocrab client.
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Fetches the default branch name for a repository.
    #[instrument(skip(self))]
    async fn fetch_default_branch(&self, owner: &str, name: &str) -> Result<String, Error> {
        let repo = self.client.repos(owner, name).get().await.map_err(|e| {
            log_octocrab_error("Failed to get repository information", e);
            Error::InvalidResponse("repository lookup failed".to_string())
        })?;

        Ok(repo.default_branch.unwrap_or_else(|| "main".to_string()))
    }

    /// Fetches and decodes the head sha of `branch`.
    async fn branch_head(&self, owner: &str, name: &str, branch: &str) -> Result<String, Error> {
        let ref_path = format!("repos/{owner}/{name}/git/ref/heads/{branch}");
        let response: serde_json::Value = self
            .client
            ._get(ref_path)
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to read branch ref", e);
                Error::InvalidResponse("could not read branch ref".to_string())
            })?
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(format!("malformed ref response: {e}")))?;

        response["object"]["sha"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidResponse("ref response missing sha".to_string()))
    }
}

#[async_trait]
impl ForgeClient for GitHubForge {
    #[instrument(skip(self))]
    async fn list_updated_pull_requests(
        &self,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PullRequest>, Error> {
        let (owner, name) = split_repo(repo)?;

        let page = self
            .client
            .pulls(owner, name)
            .list()
            .state(octocrab::params::State::Open)
            .sort(octocrab::params::pulls::Sort::Updated)
            .direction(octocrab::params::Direction::Descending)
            .send()
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to list pull requests", e);
                Error::InvalidResponse("pull request listing failed".to_string())
            })?;

        let mut result = Vec::new();
        for pr in page.items {
            if pr.updated_at.map(|u| u < since).unwrap_or(false) {
                break;
            }
            result.push(self.get_pull_request(repo, pr.number).await?);
        }

        debug!(count = result.len(), repo, "listed updated pull requests");
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn get_pull_request(&self, repo: &str, number: u64) -> Result<PullRequest, Error> {
        let (owner, name) = split_repo(repo)?;

        let pr = self
            .client
            .pulls(owner, name)
            .get(number)
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to get pull request", e);
                Error::InvalidResponse("pull request lookup failed".to_string())
            })?;

        let labels = self.list_labels(repo, number).await?;
        let reviews = self.list_reviews(repo, number).await?;
        let comments = self.list_comments(repo, number).await?;

        Ok(PullRequest {
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            body: pr.body,
            draft: pr.draft.unwrap_or_default(),
            state: if pr.closed_at.is_some() {
                PullRequestState::Closed
            } else {
                PullRequestState::Open
            },
            source_branch: pr.head.ref_field,
            target_branch: pr.base.ref_field,
            head_hash: pr.head.sha,
            author: pr.user.map(|u| User { id: u.id.0, login: u.login }),
            labels,
            reviews,
            comments,
        })
    }

    #[instrument(skip(self))]
    async fn list_new_commit_comments(
        &self,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<(Commit, CommitComment)>, Error> {
        let (owner, name) = split_repo(repo)?;

        let page = self
            .client
            .repos(owner, name)
            .list_comments()
            .since(since)
            .send()
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to list commit comments", e);
                Error::InvalidResponse("commit comment listing failed".to_string())
            })?;

        let mut result = Vec::new();
        for c in page.items {
            let commit = self.get_commit(repo, &c.commit_id).await?;
            let comment = CommitComment {
                id: c.id.into_inner(),
                user: c
                    .user
                    .map(|u| User { id: u.id.0, login: u.login })
                    .unwrap_or_default(),
                body: c.body.unwrap_or_default(),
            };
            result.push((commit, comment));
        }

        Ok(result)
    }

    #[instrument(skip(self))]
    async fn get_commit(&self, repo: &str, hash: &str) -> Result<Commit, Error> {
        let (owner, name) = split_repo(repo)?;

        let commit = self
            .client
            .commits(owner, name)
            .get(hash)
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to get commit", e);
                Error::InvalidResponse("commit lookup failed".to_string())
            })?;

        let author = commit
            .author
            .map(|u| User { id: u.id.0, login: u.login })
            .unwrap_or_default();
        let committer = commit
            .committer
            .map(|u| User { id: u.id.0, login: u.login })
            .unwrap_or_else(|| author.clone());

        Ok(Commit {
            hash: commit.sha,
            message: commit.commit.message,
            author,
            committer,
            parents: commit.parents.into_iter().map(|p| p.sha).collect(),
            commit_comments: Vec::new(),
        })
    }

    #[instrument(skip(self, body))]
    async fn add_comment(&self, repo: &str, pr: u64, body: &str) -> Result<Comment, Error> {
        let (owner, name) = split_repo(repo)?;

        let comment = self
            .client
            .issues(owner, name)
            .create_comment(pr, body)
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to add pull request comment", e);
                Error::FailedToUpdatePullRequest("failed to add comment".to_string())
            })?;

        Ok(Comment {
            id: comment.id.into_inner(),
            user: comment
                .user
                .map(|u| User { id: u.id.0, login: u.login })
                .unwrap_or_default(),
            body: comment.body.unwrap_or_default(),
        })
    }

    #[instrument(skip(self, body))]
    async fn update_comment(&self, repo: &str, comment_id: u64, body: &str) -> Result<(), Error> {
        let (owner, name) = split_repo(repo)?;

        self.client
            .issues(owner, name)
            .update_comment(comment_id.into(), body)
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to update pull request comment", e);
                Error::FailedToUpdatePullRequest("failed to update comment".to_string())
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_comment(&self, repo: &str, comment_id: u64) -> Result<(), Error> {
        let (owner, name) = split_repo(repo)?;

        self.client
            .issues(owner, name)
            .delete_comment(comment_id.into())
            .await
            .map_err(|e| {
                warn!(repo, comment_id, "failed to delete pull request comment");
                Error::FailedToUpdatePullRequest(format!("failed to delete comment: {e}"))
            })
    }

    #[instrument(skip(self))]
    async fn list_comments(&self, repo: &str, pr: u64) -> Result<Vec<Comment>, Error> {
        let (owner, name) = split_repo(repo)?;

        let page = self
            .client
            .issues(owner, name)
            .list_comments(pr)
            .send()
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to list pull request comments", e);
                Error::InvalidResponse("comment listing failed".to_string())
            })?;

        Ok(page
            .items
            .into_iter()
            .map(|c| Comment {
                id: c.id.into_inner(),
                user: c
                    .user
                    .map(|u| User { id: u.id.0, login: u.login })
                    .unwrap_or_default(),
                body: c.body.unwrap_or_default(),
            })
            .collect())
    }

    #[instrument(skip(self, body))]
    async fn add_commit_comment(
        &self,
        repo: &str,
        hash: &str,
        body: &str,
    ) -> Result<CommitComment, Error> {
        let (owner, name) = split_repo(repo)?;
        let url = format!("repos/{owner}/{name}/commits/{hash}/comments");
        let payload = json!({ "body": body });

        let response: serde_json::Value = self
            .client
            ._post(url, Some(&payload))
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to add commit comment", e);
                Error::FailedToUpdatePullRequest("failed to add commit comment".to_string())
            })?
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(format!("malformed commit comment response: {e}")))?;

        Ok(CommitComment {
            id: response["id"].as_u64().unwrap_or_default(),
            user: User {
                id: response["user"]["id"].as_u64().unwrap_or_default(),
                login: response["user"]["login"].as_str().unwrap_or_default().to_string(),
            },
            body: body.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn add_labels(&self, repo: &str, pr: u64, labels: &[String]) -> Result<(), Error> {
        let (owner, name) = split_repo(repo)?;

        self.client
            .issues(owner, name)
            .add_labels(pr, labels)
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to add labels", e);
                Error::FailedToUpdatePullRequest("failed to add labels".to_string())
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_label(&self, repo: &str, pr: u64, label: &str) -> Result<(), Error> {
        let (owner, name) = split_repo(repo)?;

        self.client
            .issues(owner, name)
            .remove_label(pr, label)
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to remove label", e);
                Error::FailedToUpdatePullRequest("failed to remove label".to_string())
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_labels(&self, repo: &str, pr: u64) -> Result<Vec<Label>, Error> {
        let (owner, name) = split_repo(repo)?;

        let mut current_page = self
            .client
            .issues(owner, name)
            .list_labels_for_issue(pr)
            .send()
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to list labels", e);
                Error::InvalidResponse("label listing failed".to_string())
            })?;

        let mut labels = current_page.take_items();
        while let Ok(Some(mut next)) = self.client.get_page(&current_page.next).await {
            labels.extend(next.take_items());
            current_page = next;
        }

        Ok(labels.into_iter().map(|l| Label { name: l.name }).collect())
    }

    #[instrument(skip(self))]
    async fn list_reviews(&self, repo: &str, pr: u64) -> Result<Vec<Review>, Error> {
        let (owner, name) = split_repo(repo)?;

        let page = self
            .client
            .pulls(owner, name)
            .list_reviews(pr)
            .send()
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to list reviews", e);
                Error::InvalidResponse("review listing failed".to_string())
            })?;

        Ok(page
            .items
            .into_iter()
            .map(|r| Review {
                id: r.id.into_inner(),
                user: r
                    .user
                    .map(|u| User { id: u.id.0, login: u.login })
                    .unwrap_or_default(),
                state: r
                    .state
                    .map(review_state_from)
                    .unwrap_or(ReviewState::Commented),
                commit_hash: r.commit_id.unwrap_or_default(),
                body: r.body,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn update_title(&self, repo: &str, pr: u64, title: &str) -> Result<(), Error> {
        let (owner, name) = split_repo(repo)?;

        self.client
            .pulls(owner, name)
            .update(pr)
            .title(title)
            .send()
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to update pull request title", e);
                Error::FailedToUpdatePullRequest("failed to update title".to_string())
            })?;

        Ok(())
    }

    #[instrument(skip(self, body))]
    async fn update_body(&self, repo: &str, pr: u64, body: &str) -> Result<(), Error> {
        let (owner, name) = split_repo(repo)?;

        self.client
            .pulls(owner, name)
            .update(pr)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to update pull request body", e);
                Error::FailedToUpdatePullRequest("failed to update body".to_string())
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn close_pull_request(&self, repo: &str, pr: u64) -> Result<(), Error> {
        let (owner, name) = split_repo(repo)?;

        self.client
            .pulls(owner, name)
            .update(pr)
            .state(octocrab::params::pulls::State::Closed)
            .send()
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to close pull request", e);
                Error::FailedToUpdatePullRequest("failed to close pull request".to_string())
            })?;

        Ok(())
    }

    #[instrument(skip(self, status))]
    async fn update_check_status(
        &self,
        repo: &str,
        commit_hash: &str,
        check_name: &str,
        status: &CheckStatus,
    ) -> Result<(), Error> {
        let (owner, name) = split_repo(repo)?;

        let conclusion = match status.conclusion {
            CheckConclusion::Success => "success",
            CheckConclusion::Failure => "failure",
            CheckConclusion::InProgress => "neutral",
        };
        let run_status = match status.conclusion {
            CheckConclusion::InProgress => "in_progress",
            _ => "completed",
        };

        let url = format!("repos/{owner}/{name}/check-runs");
        let payload = json!({
            "name": check_name,
            "head_sha": commit_hash,
            "status": run_status,
            "conclusion": conclusion,
            "output": {
                "title": status.summary,
                "summary": status.summary,
                "text": status.details,
            }
        });

        self.client._post(url, Some(&payload)).await.map_err(|e| {
            log_octocrab_error("Failed to create/update check run", e);
            Error::FailedToUpdatePullRequest("failed to update check status".to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn compare_and_set_push(
        &self,
        repo: &str,
        branch: &str,
        expected_head: &str,
        new_head: &str,
    ) -> Result<PushOutcome, Error> {
        let (owner, name) = split_repo(repo)?;

        let actual_head = self.branch_head(owner, name, branch).await?;
        if actual_head != expected_head {
            return Ok(PushOutcome::Rejected { actual_head });
        }

        let url = format!("repos/{owner}/{name}/git/refs/heads/{branch}");
        let payload = json!({ "sha": new_head, "force": false });

        self.client._patch(url, Some(&payload)).await.map_err(|e| {
            log_octocrab_error("Failed to update branch ref", e);
            Error::PushRejected(branch.to_string(), new_head.to_string())
        })?;

        Ok(PushOutcome::Accepted { new_head: new_head.to_string() })
    }

    #[instrument(skip(self))]
    async fn read_repo_file(&self, repo: &str, path: &str) -> Result<Option<Vec<u8>>, Error> {
        let (owner, name) = split_repo(repo)?;
        let default_branch = self.fetch_default_branch(owner, name).await?;

        let content_result = self
            .client
            .repos(owner, name)
            .get_content()
            .path(path)
            .r#ref(&default_branch)
            .send()
            .await;

        let response = match content_result {
            Ok(response) => response,
            Err(e) if e.to_string().contains("404") => return Ok(None),
            Err(e) => {
                log_octocrab_error("Failed to fetch repository file", e);
                return Err(Error::InvalidResponse("file fetch failed".to_string()));
            }
        };

        let Some(file) = response.items.into_iter().next() else {
            return Ok(None);
        };
        let Some(content) = file.content else {
            return Ok(None);
        };

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(content.replace('\n', ""))
            .map_err(|e| Error::InvalidResponse(format!("file content not valid base64: {e}")))?;

        Ok(Some(decoded))
    }

    #[instrument(skip(self))]
    async fn list_changed_files(&self, repo: &str, pr: u64) -> Result<Vec<String>, Error> {
        let (owner, name) = split_repo(repo)?;

        let mut current_page = self
            .client
            .pulls(owner, name)
            .list_files(pr)
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to list changed files", e);
                Error::InvalidResponse("changed file listing failed".to_string())
            })?;

        let mut files = current_page.take_items();
        while let Ok(Some(mut next)) = self.client.get_page(&current_page.next).await {
            files.extend(next.take_items());
            current_page = next;
        }

        Ok(files.into_iter().map(|f| f.filename).collect())
    }
}
