use std::time::Duration;

use tokio::time;
use tracing::debug;

use crate::state::{ComposeField, ComposeStore};

use super::Pacing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Completed,
    Cancelled,
}

/// Checks the panel's cancellation token before every character.
pub async fn fill_field(
    compose: &ComposeStore,
    field: ComposeField,
    text: &str,
    per_char: Duration,
) -> FillOutcome {
    let Some(panel) = compose.read(|state| state.panel()) else {
        return FillOutcome::Cancelled;
    };

    if text.is_empty() {
        let written = compose.update(|state| state.write_from_panel(panel.instance, field, ""));
        return if written {
            FillOutcome::Completed
        } else {
            FillOutcome::Cancelled
        };
    }

    let boundaries = text
        .char_indices()
        .map(|(index, ch)| index + ch.len_utf8());

    for end in boundaries {
        tokio::select! {
            biased;
            _ = panel.cancel.cancelled() => {
                debug!(%field, "fill cancelled");
                return FillOutcome::Cancelled;
            }
            _ = time::sleep(per_char) => {}
        }

        let prefix = &text[..end];
        if !compose.update(|state| state.write_from_panel(panel.instance, field, prefix)) {
            return FillOutcome::Cancelled;
        }
    }

    FillOutcome::Completed
}

pub async fn fill_draft(
    compose: &ComposeStore,
    pacing: &Pacing,
    to: &str,
    subject: &str,
    body: &str,
) -> FillOutcome {
    let steps = [
        (ComposeField::To, to, pacing.to_char),
        (ComposeField::Subject, subject, pacing.subject_char),
        (ComposeField::Body, body, pacing.body_char),
    ];

    for (field, text, per_char) in steps {
        if fill_field(compose, field, text, per_char).await == FillOutcome::Cancelled {
            return FillOutcome::Cancelled;
        }
    }

    FillOutcome::Completed
}
