//! Waterfall dialogs.
//!
//! A waterfall is a fixed sequence of prompts. Each dialog is modelled as an
//! enum of named steps (each one a point where the bot waits for the user)
//! plus a slot accumulator, and a pure transition function
//! `(step, slots, reply) -> (next, slots, outbound)`.
//!
//! The in-flight step and slots are persisted between turns as the
//! conversation's `dialogState`; completion is reported per call through
//! [`DialogTurnResult`].

pub mod cancellation;
pub mod reservation;

use crate::activity::{OutboundMessage, TurnContext};
use crate::error::BotError;
use crate::intent::Entities;
use crate::state::UserState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use cancellation::{CancellationDialog, CancellationInstance, CancellationStep};
pub use reservation::{ReservationDialog, ReservationInstance, ReservationStep};

/// The user's answer to the prompt the dialog is waiting on.
#[derive(Debug, Clone, Copy)]
pub struct Reply<'a> {
    pub text: &'a str,
    /// Day that relative dates resolve against.
    pub today: NaiveDate,
}

impl<'a> Reply<'a> {
    pub fn new(text: &'a str, today: NaiveDate) -> Self {
        Self { text, today }
    }
}

/// Where a waterfall goes after consuming a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next<S, O> {
    /// Suspend on `S` until the next reply.
    Await(S),
    /// Terminal: the dialog is over.
    End(O),
}

/// Result of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<S, A, O> {
    pub next: Next<S, O>,
    pub slots: A,
    pub outbound: Vec<OutboundMessage>,
}

impl<S, A, O> Transition<S, A, O> {
    pub fn wait(step: S, slots: A, outbound: Vec<OutboundMessage>) -> Self {
        Self {
            next: Next::Await(step),
            slots,
            outbound,
        }
    }

    pub fn end(outcome: O, slots: A, outbound: Vec<OutboundMessage>) -> Self {
        Self {
            next: Next::End(outcome),
            slots,
            outbound,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.next, Next::End(_))
    }
}

/// Whether the dialog is still waiting for input after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogStatus {
    Waiting,
    Complete,
}

/// What a single `run` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogTurnResult {
    pub status: DialogStatus,
}

impl DialogTurnResult {
    pub fn waiting() -> Self {
        Self {
            status: DialogStatus::Waiting,
        }
    }

    pub fn complete() -> Self {
        Self {
            status: DialogStatus::Complete,
        }
    }

    /// True if a terminal step was reached during this call.
    pub fn is_complete(&self) -> bool {
        self.status == DialogStatus::Complete
    }
}

/// The persisted in-flight dialog instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dialog", content = "instance", rename_all = "camelCase")]
pub enum ActiveDialog {
    MakeReservation(ReservationInstance),
    CancelReservation(CancellationInstance),
}

/// A dialog the dispatcher can run for an intent.
pub trait Dialog: Send + Sync {
    /// Stable identifier used in logs.
    fn id(&self) -> &'static str;

    /// Begins the dialog if `dialog_state` holds no instance of it, otherwise
    /// feeds the turn's message to the waiting step.
    ///
    /// On completion the instance is removed from `dialog_state`.
    fn run(
        &self,
        ctx: &mut TurnContext,
        dialog_state: &mut Option<ActiveDialog>,
        user: &mut UserState,
        entities: &Entities,
    ) -> Result<DialogTurnResult, BotError>;
}

/// The reply carried by the current turn.
pub(crate) fn reply_from(ctx: &TurnContext) -> Reply<'_> {
    Reply::new(ctx.activity().text().unwrap_or_default(), ctx.local_date())
}
