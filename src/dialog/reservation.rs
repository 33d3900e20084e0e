//! The make-reservation waterfall.
//!
//! ```text
//! AskConfirm -> CollectName -> [CollectPartySize] -> CollectDate -> CollectTime -> SummaryConfirm
//!     | no                                                                         | yes / no
//!     v                                                                            v
//!  Declined                                                              Booked / Abandoned
//! ```
//!
//! `CollectPartySize` is skipped when the utterance that started the dialog
//! already carried a valid party size. Handling the `SummaryConfirm` reply is
//! the finalize step.

use super::{ActiveDialog, Dialog, DialogTurnResult, Next, Reply, Transition, reply_from};
use crate::activity::{OutboundMessage, TurnContext};
use crate::error::BotError;
use crate::intent::Entities;
use crate::prompt::{
    Prompt, recognize_confirm, recognize_datetime, recognize_number, recognize_text,
};
use crate::state::{Reservation, UserState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const ASK_CONFIRM: Prompt = Prompt::confirm("Would you like to make the reservation");
pub const ASK_NAME: Prompt = Prompt::text("Please enter your name.");
pub const ASK_PARTY_SIZE: Prompt =
    Prompt::number("How many people you wish to make reservation for (0 - 50)?");
pub const ASK_DATE: Prompt =
    Prompt::datetime("Please enter the date you want to make the reservation");
pub const ASK_TIME: Prompt = Prompt::datetime("At what time?");
pub const ASK_PROCEED: Prompt = Prompt::confirm("Do you want to proceed?");

pub const DECLINED_MESSAGE: &str = "You chose not to make reservation";
pub const SUCCESS_MESSAGE: &str = "Reservation Successfully made!";

const SUMMARY_TEMPLATE: &str = "You have entered following values:
Name: {{ name }}
Number of people: {{ party_size }}
Date: {{ date }}
Time: {{ time }}";

/// Accepts party sizes strictly between 1 and 50.
pub fn is_valid_party_size(n: i64) -> bool {
    n > 1 && n < 50
}

/// The step the reservation waterfall is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReservationStep {
    AskConfirm,
    CollectName,
    CollectPartySize,
    CollectDate,
    CollectTime,
    SummaryConfirm,
}

impl ReservationStep {
    pub fn prompt(&self) -> Prompt {
        match self {
            ReservationStep::AskConfirm => ASK_CONFIRM,
            ReservationStep::CollectName => ASK_NAME,
            ReservationStep::CollectPartySize => ASK_PARTY_SIZE,
            ReservationStep::CollectDate => ASK_DATE,
            ReservationStep::CollectTime => ASK_TIME,
            ReservationStep::SummaryConfirm => ASK_PROCEED,
        }
    }
}

/// Values collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSlots {
    pub name: Option<String>,
    pub party_size: Option<i64>,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl ReservationSlots {
    /// The booking, once every slot is filled.
    pub fn to_reservation(&self) -> Option<Reservation> {
        Some(Reservation {
            name: self.name.clone()?,
            party_size: self.party_size?,
            date: self.date.clone()?,
            time: self.time.clone()?,
        })
    }
}

/// How a reservation dialog ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// "no" at `AskConfirm`.
    Declined,
    /// "yes" at `SummaryConfirm`.
    Booked(Reservation),
    /// "no" at `SummaryConfirm`.
    Abandoned,
}

pub type ReservationTransition = Transition<ReservationStep, ReservationSlots, ReservationOutcome>;

/// A persisted, in-flight reservation dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationInstance {
    pub step: ReservationStep,
    pub slots: ReservationSlots,
}

fn ask(step: ReservationStep, slots: ReservationSlots) -> ReservationTransition {
    Transition::wait(step, slots, vec![step.prompt().render()])
}

fn retry(step: ReservationStep, slots: ReservationSlots, reply: &Reply<'_>) -> ReservationTransition {
    debug!(
        target = "rambo::dialog",
        dialog = ReservationDialog::ID,
        step = ?step,
        reply = reply.text,
        event = "prompt_retry"
    );
    ask(step, slots)
}

fn render_summary(slots: &ReservationSlots) -> Result<String, BotError> {
    Ok(crate::prompt!(
        SUMMARY_TEMPLATE,
        name = &slots.name,
        party_size = slots.party_size,
        date = &slots.date,
        time = &slots.time,
    )?)
}

/// Enters the waterfall at `AskConfirm`.
///
/// A party size among `entities` is kept when it passes validation, which
/// later lets `CollectName` skip straight to `CollectDate`.
pub fn begin(entities: &Entities) -> ReservationTransition {
    let mut slots = ReservationSlots::default();
    if let Some(size) = entities.party_size() {
        if is_valid_party_size(size) {
            slots.party_size = Some(size);
        } else {
            warn!(
                target = "rambo::dialog",
                dialog = ReservationDialog::ID,
                party_size = size,
                event = "entity_party_size_rejected"
            );
        }
    }
    ask(ReservationStep::AskConfirm, slots)
}

/// Consumes one reply at `step`.
pub fn transition(
    step: ReservationStep,
    mut slots: ReservationSlots,
    reply: &Reply<'_>,
) -> Result<ReservationTransition, BotError> {
    let next = match step {
        ReservationStep::AskConfirm => match recognize_confirm(reply.text) {
            Some(true) => ask(ReservationStep::CollectName, slots),
            Some(false) => Transition::end(
                ReservationOutcome::Declined,
                slots,
                vec![OutboundMessage::text(DECLINED_MESSAGE)],
            ),
            None => retry(step, slots, reply),
        },
        ReservationStep::CollectName => match recognize_text(reply.text) {
            Some(name) => {
                slots.name = Some(name);
                if slots.party_size.is_some() {
                    ask(ReservationStep::CollectDate, slots)
                } else {
                    ask(ReservationStep::CollectPartySize, slots)
                }
            }
            None => retry(step, slots, reply),
        },
        ReservationStep::CollectPartySize => {
            match recognize_number(reply.text).filter(|n| is_valid_party_size(*n)) {
                Some(size) => {
                    slots.party_size = Some(size);
                    ask(ReservationStep::CollectDate, slots)
                }
                None => retry(step, slots, reply),
            }
        }
        ReservationStep::CollectDate => match recognize_datetime(reply.text, reply.today) {
            Some(resolution) => {
                slots.date = Some(resolution.to_string());
                ask(ReservationStep::CollectTime, slots)
            }
            None => retry(step, slots, reply),
        },
        ReservationStep::CollectTime => match recognize_datetime(reply.text, reply.today) {
            Some(resolution) => {
                slots.time = Some(resolution.to_string());
                let summary = render_summary(&slots)?;
                Transition::wait(
                    ReservationStep::SummaryConfirm,
                    slots,
                    vec![OutboundMessage::text(summary), ASK_PROCEED.render()],
                )
            }
            None => retry(step, slots, reply),
        },
        ReservationStep::SummaryConfirm => match recognize_confirm(reply.text) {
            Some(true) => {
                let reservation = slots.to_reservation().ok_or_else(|| {
                    BotError::Store("reservation dialog reached summary with empty slots".into())
                })?;
                Transition::end(
                    ReservationOutcome::Booked(reservation),
                    slots,
                    vec![OutboundMessage::text(SUCCESS_MESSAGE)],
                )
            }
            Some(false) => Transition::end(
                ReservationOutcome::Abandoned,
                slots,
                vec![OutboundMessage::text(DECLINED_MESSAGE)],
            ),
            None => retry(step, slots, reply),
        },
    };
    Ok(next)
}

/// Runs the reservation waterfall for one turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReservationDialog;

impl ReservationDialog {
    pub const ID: &'static str = "makeReservationDialog";

    pub fn new() -> Self {
        Self
    }
}

impl Dialog for ReservationDialog {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn run(
        &self,
        ctx: &mut TurnContext,
        dialog_state: &mut Option<ActiveDialog>,
        user: &mut UserState,
        entities: &Entities,
    ) -> Result<DialogTurnResult, BotError> {
        let instance = match dialog_state.take() {
            Some(ActiveDialog::MakeReservation(instance)) => Some(instance),
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

        let step_in = instance.as_ref().map(|i| i.step);
        let result = match instance {
            None => begin(entities),
            Some(ReservationInstance { step, slots }) => {
                transition(step, slots, &reply_from(ctx))?
            }
        };

        for message in result.outbound {
            ctx.send(message);
        }

        match result.next {
            Next::Await(step) => {
                debug!(
                    target = "rambo::dialog",
                    dialog = Self::ID,
                    from = ?step_in,
                    to = ?step,
                    event = "dialog_waiting"
                );
                *dialog_state = Some(ActiveDialog::MakeReservation(ReservationInstance {
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
                if let ReservationOutcome::Booked(reservation) = outcome {
                    user.reservations.push(reservation);
                }
                Ok(DialogTurnResult::complete())
            }
        }
    }
}
