use proptest::prelude::*;

use super::*;

proptest! {
    #[test]
    fn command_line_regex_never_panics_on_arbitrary_input(input in ".*") {
        let _ = COMMAND_LINE_RE.is_match(&input);
    }

    #[test]
    fn extract_commands_never_panics_on_arbitrary_input(input in ".*") {
        let _ = extract_commands(&input);
    }
}

#[test]
fn extracts_a_single_command_with_no_arguments() {
    let commands = extract_commands("/help");

    assert_eq!(
        commands,
        vec![ParsedCommand {
            name: "help".to_string(),
            arguments: String::new(),
        }]
    );
}

#[test]
fn extracts_arguments_on_the_same_line() {
    let commands = extract_commands("/reviewers 2 committer");

    assert_eq!(commands[0].name, "reviewers");
    assert_eq!(commands[0].arguments, "2 committer");
}

#[test]
fn multi_line_arguments_continue_until_the_next_command() {
    let body = "/summary\nThis change fixes the frobnicator\nand adds a regression test.\n/label add docs";

    let commands = extract_commands(body);

    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].name, "summary");
    assert_eq!(
        commands[0].arguments,
        "This change fixes the frobnicator\nand adds a regression test."
    );
    assert_eq!(commands[1].name, "label");
    assert_eq!(commands[1].arguments, "add docs");
}

#[test]
fn text_before_the_first_command_is_ignored() {
    let body = "Thanks for the review!\n/integrate";

    let commands = extract_commands(body);

    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].name, "integrate");
}

#[test]
fn text_with_no_commands_yields_nothing() {
    assert!(extract_commands("just a regular comment, no slash here").is_empty());
}

#[test]
fn slash_not_at_line_start_is_not_a_command() {
    let body = "see the docs at path/to/file for details";

    assert!(extract_commands(body).is_empty());
}

#[test]
fn invocations_from_comment_carries_self_command_marker() {
    let body = format!("/integrate\n{}", crate::markers::SELF_COMMAND_MARKER);

    let invocations = invocations_from_comment("review-warden-bot", 3, &body);

    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].has_self_command_marker);
    assert_eq!(invocations[0].location, 3);
}

#[test]
fn invocations_from_body_are_always_at_location_zero() {
    let invocations = invocations_from_body("alice", "/summary\nFixes a bug.");

    assert_eq!(invocations[0].location, 0);
    assert_eq!(invocations[0].source, InvocationSource::Body);
}
