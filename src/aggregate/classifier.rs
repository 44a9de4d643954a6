//! Response classification.
//!
//! Maps the pair of settled outcomes to a response document:
//!
//! ```text
//! post     user     result
//! Ok       Ok       post_title + author_name
//! Ok       Err      post_title, author_name "N/A", warning "User data unavailable"
//! Err      Ok       post_title "N/A", author_name, warning "Post data unavailable"
//! Err      Err      the post failure, propagated
//! ```
//!
//! Pure: no I/O, no clock, no shared state.

use crate::aggregate::outcome::{AggregateResult, CallOutcome, Failure, UNAVAILABLE};

pub const USER_UNAVAILABLE: &str = "User data unavailable";
pub const POST_UNAVAILABLE: &str = "Post data unavailable";

/// Combine the post and user outcomes.
pub fn classify(post: &CallOutcome, user: &CallOutcome) -> Result<AggregateResult, Failure> {
    match (post, user) {
        (Ok(post), Ok(user)) => Ok(AggregateResult {
            post_title: post.text_field("title"),
            author_name: user.text_field("name"),
            warning: None,
        }),
        (Ok(post), Err(_)) => Ok(AggregateResult {
            post_title: post.text_field("title"),
            author_name: UNAVAILABLE.to_string(),
            warning: Some(USER_UNAVAILABLE.to_string()),
        }),
        (Err(_), Ok(user)) => Ok(AggregateResult {
            post_title: UNAVAILABLE.to_string(),
            author_name: user.text_field("name"),
            warning: Some(POST_UNAVAILABLE.to_string()),
        }),
        // Post failure is reported first when both fail.
        (Err(post_failure), Err(_)) => Err(post_failure.clone()),
    }
}
