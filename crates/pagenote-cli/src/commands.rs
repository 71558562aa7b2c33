use std::io::{BufRead, Write};

use chrono::Local;
use nu_ansi_term::Color::{Blue, Cyan, Green, Red, Yellow};
use pagenote_core::{
    error::{ErrorContext, PagenoteError},
    feedback::{count_on, search, FeedbackDraft},
    router::{ping_reply, Reply, Request, Router},
    summary::Summary,
    PagenoteResult,
};
use tracing::{debug, info};

use crate::utils::{truncate, Colored};

/// Prints `reply` as JSON, or hands it to `render` when it succeeded.
fn report<F>(reply: Reply, json: bool, render: F) -> PagenoteResult<()>
where
    F: FnOnce(&Reply),
{
    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else if reply.is_success() {
        render(&reply);
    }

    if reply.is_success() {
        return Ok(());
    }
    Err(PagenoteError::Custom(
        reply.error.unwrap_or_else(|| "Unknown error".to_string()),
    ))
}

pub fn ping(json: bool) -> PagenoteResult<()> {
    let reply = ping_reply();
    report(reply, json, |reply| {
        info!(
            "{} {}",
            Colored(Green, reply.message.as_deref().unwrap_or_default()),
            reply.timestamp.as_deref().unwrap_or_default()
        );
    })
}

pub async fn test_connection(router: &Router, json: bool) -> PagenoteResult<()> {
    let reply = router.handle(Request::TestConnection).await;
    report(reply, json, |reply| {
        info!(
            "{} (table {})",
            Colored(Green, reply.message.as_deref().unwrap_or_default()),
            Colored(Cyan, router.service().table())
        );
    })
}

pub async fn save(router: &Router, url: String, text: String, json: bool) -> PagenoteResult<()> {
    let request = Request::SaveFeedback {
        feedback: FeedbackDraft {
            url,
            feedback: text,
        },
    };
    let reply = router.handle(request).await;
    report(reply, json, |reply| {
        match reply.id.as_ref().filter(|id| !id.is_null()) {
            Some(id) => info!("Feedback saved with id {}", Colored(Cyan, id)),
            None => info!("Feedback saved"),
        }
    })
}

pub async fn list(
    router: &Router,
    url: String,
    query: Option<String>,
    json: bool,
) -> PagenoteResult<()> {
    let mut reply = router.handle(Request::GetFeedback { url }).await;

    if let (Some(query), Some(entries)) = (query.as_deref(), reply.feedbacks.as_mut()) {
        let kept: Vec<_> = search(entries.as_slice(), query)
            .into_iter()
            .cloned()
            .collect();
        debug!("Search {:?} kept {} of {} items", query, kept.len(), entries.len());
        *entries = kept;
    }

    let available = reply
        .feedbacks
        .as_ref()
        .is_some_and(|entries| router.summarizer().summary_available(entries.len()));

    report(reply, json, |reply| {
        let entries = reply.feedbacks.as_deref().unwrap_or_default();
        if entries.is_empty() {
            info!("No feedback found");
            return;
        }

        for entry in entries {
            let kind = entry
                .kind
                .as_deref()
                .map(|kind| format!(" {}", Colored(Yellow, format!("[{kind}]"))))
                .unwrap_or_default();
            info!(
                "{}{} {}",
                Colored(Blue, entry.created_at.as_deref().unwrap_or("-")),
                kind,
                truncate(entry.content().unwrap_or("No content"), 200)
            );
        }
        let today = count_on(entries, Local::now().date_naive());
        info!(
            "\n{} feedback items, {} today",
            Colored(Green, entries.len()),
            Colored(Cyan, today)
        );

        if available {
            info!("Run `pagenote summarize` for an AI summary");
        }
    })
}

pub async fn summarize(router: &Router, url: String, json: bool) -> PagenoteResult<()> {
    let reply = router.handle(Request::GenerateSummary { url }).await;
    report(reply, json, |reply| {
        if let Some(summary) = &reply.summary {
            print_summary(summary);
        }
    })
}

fn print_summary(summary: &Summary) {
    info!("{}\n", summary.summary);
    info!(
        "{}: {}  {}: {}  Total: {}",
        Colored(Green, "Positive"),
        summary.sentiment.positive,
        Colored(Red, "Negative"),
        summary.sentiment.negative,
        summary.sentiment.total
    );

    for point in &summary.details.positive_points {
        info!("  {} {}", Colored(Green, "+"), point);
    }
    for point in &summary.details.negative_points {
        info!("  {} {}", Colored(Red, "-"), point);
    }
}

/// Reads one JSON request per line from stdin and writes one JSON reply per
/// line to stdout. Blank lines are skipped.
pub async fn route(router: &Router) -> PagenoteResult<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let handled = route_lines(router, stdin.lock(), stdout.lock()).await?;
    debug!("Answered {} requests", handled);
    Ok(())
}

async fn route_lines<R, W>(router: &Router, input: R, mut output: W) -> PagenoteResult<usize>
where
    R: BufRead,
    W: Write,
{
    let mut handled = 0;
    for line in input.lines() {
        let line = line.with_context(|| "reading request from stdin".to_string())?;
        if line.trim().is_empty() {
            continue;
        }

        let reply = router.handle_json(&line).await;
        serde_json::to_writer(&mut output, &reply)?;
        writeln!(output).with_context(|| "writing reply to stdout".to_string())?;
        output
            .flush()
            .with_context(|| "flushing stdout".to_string())?;
        handled += 1;
    }
    Ok(handled)
}
