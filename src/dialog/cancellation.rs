//! The cancel-reservation waterfall.
//!
//! `AskConfirm -> CollectName -> ConfirmCancel`. The name is matched against
//! the user's stored bookings; an unknown name ends the dialog straight away.

use super::{ActiveDialog, Dialog, DialogTurnResult, Next, Reply, Transition, reply_from};
use crate::activity::{OutboundMessage, TurnContext};
use crate::error::BotError;
use crate::intent::Entities;
use crate::prompt::{Prompt, recognize_confirm, recognize_text};
use crate::state::{Reservation, UserState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const ASK_CONFIRM: Prompt = Prompt::confirm("Would you like to cancel the reservation");
pub const ASK_NAME: Prompt = Prompt::text("Please enter the name the reservation was made under.");
pub const ASK_CONFIRM_CANCEL: Prompt =
    Prompt::confirm("Are you sure you want to cancel the reservation?");

pub const DECLINED_MESSAGE: &str = "You chose not to cancel reservation";
pub const NOT_FOUND_MESSAGE: &str = "I could not find a reservation under that name.";
pub const CANCELLED_MESSAGE: &str = "Reservation successfully cancelled.";

const DETAILS_TEMPLATE: &str =
    "Reservation for {{ name }}: {{ party_size }} people on {{ date }} at {{ time }}.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CancellationStep {
    AskConfirm,
    CollectName,
    ConfirmCancel,
}

impl CancellationStep {
    pub fn prompt(&self) -> Prompt {
        match self {
            CancellationStep::AskConfirm => ASK_CONFIRM,
            CancellationStep::CollectName => ASK_NAME,
            CancellationStep::ConfirmCancel => ASK_CONFIRM_CANCEL,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationSlots {
    pub name: Option<String>,
    /// The booking selected by name.
    pub reservation: Option<Reservation>,
}

/// How a cancellation dialog ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationOutcome {
    Declined,
    NotFound,
    Cancelled(Reservation),
    /// "no" at `ConfirmCancel`: the booking stays.
    Kept,
}

pub type CancellationTransition =
    Transition<CancellationStep, CancellationSlots, CancellationOutcome>;

/// A persisted, in-flight cancellation dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationInstance {
    pub step: CancellationStep,
    pub slots: CancellationSlots,
}

fn ask(step: CancellationStep, slots: CancellationSlots) -> CancellationTransition {
    Transition::wait(step, slots, vec![step.prompt().render()])
}

fn retry(
    step: CancellationStep,
    slots: CancellationSlots,
    reply: &Reply<'_>,
) -> CancellationTransition {
    debug!(
        target = "rambo::dialog",
        dialog = CancellationDialog::ID,
        step = ?step,
        reply = reply.text,
        event = "prompt_retry"
    );
    ask(step, slots)
}

fn end(outcome: CancellationOutcome, slots: CancellationSlots, text: &str) -> CancellationTransition {
    Transition::end(outcome, slots, vec![OutboundMessage::text(text)])
}

pub fn begin() -> CancellationTransition {
    ask(CancellationStep::AskConfirm, CancellationSlots::default())
}

/// Consumes one reply at `step`, looking bookings up in `user`.
pub fn transition(
    step: CancellationStep,
    mut slots: CancellationSlots,
    reply: &Reply<'_>,
    user: &UserState,
) -> Result<CancellationTransition, BotError> {
    let next = match step {
        CancellationStep::AskConfirm => match recognize_confirm(reply.text) {
            Some(true) => ask(CancellationStep::CollectName, slots),
            Some(false) => end(CancellationOutcome::Declined, slots, DECLINED_MESSAGE),
            None => retry(step, slots, reply),
        },
        CancellationStep::CollectName => match recognize_text(reply.text) {
            Some(name) => {
                let found = user.find_by_name(&name).cloned();
                slots.name = Some(name);
                match found {
                    Some(reservation) => {
                        let details = crate::prompt!(
                            DETAILS_TEMPLATE,
                            name = &reservation.name,
                            party_size = reservation.party_size,
                            date = &reservation.date,
                            time = &reservation.time,
                        )?;
                        slots.reservation = Some(reservation);
                        Transition::wait(
                            CancellationStep::ConfirmCancel,
                            slots,
                            vec![OutboundMessage::text(details), ASK_CONFIRM_CANCEL.render()],
                        )
                    }
                    None => end(CancellationOutcome::NotFound, slots, NOT_FOUND_MESSAGE),
                }
            }
            None => retry(step, slots, reply),
        },
        CancellationStep::ConfirmCancel => match recognize_confirm(reply.text) {
            Some(true) => {
                let reservation = slots.reservation.clone().ok_or_else(|| {
                    BotError::Store("cancellation dialog lost its selected booking".into())
                })?;
                end(
                    CancellationOutcome::Cancelled(reservation),
                    slots,
                    CANCELLED_MESSAGE,
                )
            }
            Some(false) => end(CancellationOutcome::Kept, slots, DECLINED_MESSAGE),
            None => retry(step, slots, reply),
        },
    };
    Ok(next)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CancellationDialog;

impl CancellationDialog {
    pub const ID: &'static str = "cancelReservationDialog";

    pub fn new() -> Self {
        Self
    }
}

impl Dialog for CancellationDialog {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn run(
        &self,
        ctx: &mut TurnContext,
        dialog_state: &mut Option<ActiveDialog>,
        user: &mut UserState,
        _entities: &Entities,
    ) -> Result<DialogTurnResult, BotError> {
        let instance = match dialog_state.take() {
            Some(ActiveDialog::CancelReservation(instance)) => Some(instance),
            Some(other) => {
                warn!(
                    target = "rambo::dialog",
                    dialog = Self::ID,
                    discarded = ?other,
                    event = "foreign_dialog_discarded"
                );
                None
            }
            None => None,
        };

        let result = match instance {
            None => begin(),
            Some(CancellationInstance { step, slots }) => {
                transition(step, slots, &reply_from(ctx), user)?
            }
        };

        for message in result.outbound {
            ctx.send(message);
        }

        match result.next {
            Next::Await(step) => {
                *dialog_state = Some(ActiveDialog::CancelReservation(CancellationInstance {
                    step,
                    slots: result.slots,
                }));
                Ok(DialogTurnResult::waiting())
            }
            Next::End(outcome) => {
                info!(
                    target = "rambo::dialog",
                    dialog = Self::ID,
                    outcome = ?outcome,
                    event = "dialog_completed"
                );
                if let CancellationOutcome::Cancelled(reservation) = &outcome {
                    if !user.remove(reservation) {
                        warn!(
                            target = "rambo::dialog",
                            dialog = Self::ID,
                            name = %reservation.name,
                            event = "booking_already_removed"
                        );
                    }
                }
                Ok(DialogTurnResult::complete())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reply(text: &str) -> Reply<'_> {
        Reply::new(text, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
    }

    fn booking(name: &str) -> Reservation {
        Reservation {
            name: name.to_string(),
            party_size: 3,
            date: "2026-10-22".to_string(),
            time: "20:00:00".to_string(),
        }
    }

    fn user_with(names: &[&str]) -> UserState {
        UserState {
            reservations: names.iter().map(|n| booking(n)).collect(),
        }
    }

    fn texts(t: &CancellationTransition) -> Vec<&str> {
        t.outbound.iter().map(|m| m.content()).collect()
    }

    #[test]
    fn test_begin_asks_confirmation() {
        let t = begin();
        assert_eq!(t.next, Next::Await(CancellationStep::AskConfirm));
        assert_eq!(
            texts(&t),
            vec!["Would you like to cancel the reservation (1) yes or (2) no"]
        );
    }

    #[test]
    fn test_decline_at_confirm() {
        let t = transition(
            CancellationStep::AskConfirm,
            CancellationSlots::default(),
            &reply("no"),
            &UserState::default(),
        )
        .unwrap();
        assert_eq!(t.next, Next::End(CancellationOutcome::Declined));
        assert_eq!(texts(&t), vec![DECLINED_MESSAGE]);
    }

    #[test]
    fn test_unknown_name_ends() {
        let t = transition(
            CancellationStep::CollectName,
            CancellationSlots::default(),
            &reply("Zed"),
            &user_with(&["Alice"]),
        )
        .unwrap();
        assert_eq!(t.next, Next::End(CancellationOutcome::NotFound));
        assert_eq!(texts(&t), vec![NOT_FOUND_MESSAGE]);
    }

    #[test]
    fn test_name_match_is_case_insensitive() {
        let t = transition(
            CancellationStep::CollectName,
            CancellationSlots::default(),
            &reply("  alice "),
            &user_with(&["Bob", "Alice"]),
        )
        .unwrap();
        assert_eq!(t.next, Next::Await(CancellationStep::ConfirmCancel));
        assert_eq!(t.slots.reservation, Some(booking("Alice")));
        assert_eq!(
            texts(&t),
            vec![
                "Reservation for Alice: 3 people on 2026-10-22 at 20:00:00.",
                "Are you sure you want to cancel the reservation? (1) yes or (2) no",
            ]
        );
    }

    #[test]
    fn test_confirm_cancels_and_no_keeps() {
        let slots = CancellationSlots {
            name: Some("Alice".to_string()),
            reservation: Some(booking("Alice")),
        };
        let t = transition(CancellationStep::ConfirmCancel, slots.clone(), &reply("yes"), &UserState::default())
            .unwrap();
        assert_eq!(
            t.next,
            Next::End(CancellationOutcome::Cancelled(booking("Alice")))
        );
        assert_eq!(texts(&t), vec![CANCELLED_MESSAGE]);

        let t = transition(CancellationStep::ConfirmCancel, slots, &reply("no"), &UserState::default()).unwrap();
        assert_eq!(t.next, Next::End(CancellationOutcome::Kept));
    }

    #[test]
    fn test_confirm_without_selection_is_error() {
        let result = transition(
            CancellationStep::ConfirmCancel,
            CancellationSlots::default(),
            &reply("yes"),
            &UserState::default(),
        );
        assert!(matches!(result, Err(BotError::Store(_))));
    }

    #[test]
    fn test_run_removes_booking() {
        use crate::activity::{Activity, ChannelAccount};

        let dialog = CancellationDialog::new();
        let mut state = None;
        let mut user = UserState {
            reservations: vec![booking("Alice"), booking("Bob")],
        };

        for text in ["cancel my booking", "yes", "Alice", "yes"] {
            let activity = Activity::message(
                "c1",
                ChannelAccount::new("u1", "Alice"),
                ChannelAccount::new("bot", "rambo"),
                text,
            );
            let mut ctx = TurnContext::new(activity);
            dialog
                .run(&mut ctx, &mut state, &mut user, &Entities::default())
                .unwrap();
        }

        assert!(state.is_none());
        assert_eq!(user.reservations, vec![booking("Bob")]);
    }
}
