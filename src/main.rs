//! Console channel: one conversation on stdin/stdout.
//!
//! ```text
//! RAMBO_LOG=debug RAMBO_STATE_DIR=./state cargo run
//! ```

use anyhow::{Context, Result};
use rambo::activity::{Activity, ChannelAccount, OutboundMessage};
use rambo::observability::{self, ObservabilityConfig};
use rambo::{BotConfig, RestaurantBot};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const CONVERSATION_ID: &str = "console";

fn render(message: &OutboundMessage) -> String {
    match message {
        OutboundMessage::Text { text } => format!("rambo> {text}"),
        OutboundMessage::SuggestedActions { text, actions } => {
            let mut out = format!("rambo> {text}");
            for (idx, action) in actions.iter().enumerate() {
                out.push_str(&format!("\n       [{}] {}", idx + 1, action));
            }
            out
        }
    }
}

/// Lets the user answer the menu by its number.
fn resolve_menu_choice(line: &str, last_menu: Option<&[String]>) -> String {
    let trimmed = line.trim();
    match (last_menu, trimmed.parse::<usize>()) {
        (Some(actions), Ok(n)) if n >= 1 && n <= actions.len() => actions[n - 1].clone(),
        _ => trimmed.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = BotConfig::from_env();
    observability::init(ObservabilityConfig::default().with_level_name(&config.log_level))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let bot = RestaurantBot::from_config(&config);
    let user = ChannelAccount::new(
        "console-user",
        std::env::var("USER").unwrap_or_else(|_| "guest".to_string()),
    );
    let rambo = ChannelAccount::new("rambo", "rambo");

    let mut stdout = tokio::io::stdout();
    let mut last_menu: Option<Vec<String>> = None;

    let greeting = Activity::members_added(CONVERSATION_ID, vec![user.clone()], rambo.clone());
    let mut replies = bot.on_turn(greeting).await.context("welcome turn failed")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        for reply in &replies {
            // Only the most recent menu is answerable by number.
            last_menu = match reply {
                OutboundMessage::SuggestedActions { actions, .. } => Some(actions.clone()),
                OutboundMessage::Text { .. } => None,
            };
            stdout.write_all(render(reply).as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            replies = Vec::new();
            continue;
        }

        let text = resolve_menu_choice(&line, last_menu.as_deref());
        let activity = Activity::message(CONVERSATION_ID, user.clone(), rambo.clone(), text);
        replies = bot.on_turn(activity).await.context("turn failed")?;
    }

    stdout.write_all(b"\n").await?;
    Ok(())
}
