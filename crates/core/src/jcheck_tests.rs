use super::*;
use review_warden_forge::models::CheckConclusion;

fn status(hash: &str) -> CheckStatus {
    CheckStatus {
        conclusion: CheckConclusion::Success,
        commit_hash: hash.to_string(),
        summary: "jcheck passed".to_string(),
        details: String::new(),
    }
}

#[tokio::test]
async fn static_facade_returns_the_fixed_result_regardless_of_commit() {
    let facade = StaticJcheckFacade::new(status("abc123"));

    let result = facade.validate("openjdk/jdk", "deadbeef").await.unwrap();

    assert_eq!(result.commit_hash, "abc123");
}
