//! Selection cursor: which selection needs input next.
//!
//! Two ordered passes over the declaration, required selections first, so a
//! player is never prompted for an optional parameter while a required one is
//! unanswered. As it scans, the cursor auto-fills `skip_if_only_one`
//! selections whose effective candidate set has exactly one member.

use crate::session::ActionSession;

/// Returns the index of the next selection requiring input, auto-filling
/// eligible selections along the way. `None` means every selection is set or
/// skipped: the action is ready to submit.
pub fn next_selection(session: &mut ActionSession) -> Option<usize> {
    scan_pass(session, false).or_else(|| scan_pass(session, true))
}

fn scan_pass(session: &mut ActionSession, optional_pass: bool) -> Option<usize> {
    for index in 0..session.spec().selections.len() {
        let selection = &session.spec().selections[index];
        if selection.optional != optional_pass {
            continue;
        }
        if session.args.status(&selection.name).is_resolved() {
            continue;
        }

        if auto_fill_eligible(session, index) {
            let choices = session.available_choices_at(index);
            if choices.len() == 1 {
                let choice = choices.into_iter().next().expect("length checked");
                tracing::debug!(
                    selection = %session.spec().selections[index].name,
                    kind = session.spec().selections[index].kind.as_ref(),
                    label = %choice.label,
                    "auto-filling single-candidate selection"
                );
                session.bind_choice(index, &choice);
                continue;
            }
        }

        return Some(index);
    }
    None
}

/// Auto-fill applies only to plain enumerable selections. Repeating
/// selections are server-owned (a lone offered choice is not a terminal
/// state), multi-select bindings are arrays with their own confirm step, and
/// free-form inputs have no candidate to fill from.
fn auto_fill_eligible(session: &ActionSession, index: usize) -> bool {
    let selection = &session.spec().selections[index];
    selection.skip_if_only_one
        && selection.repeat.is_none()
        && selection.multi_select.is_none()
        && selection.candidates.is_enumerable()
        && session
            .multi
            .as_ref()
            .is_none_or(|state| state.selection != selection.name)
}
