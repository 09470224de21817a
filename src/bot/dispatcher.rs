use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::analyzer::{analyze_rolling_average, sort_chronological};
use crate::api::health::HealthState;
use crate::bot::commands::{self, Command};
use crate::bot::format::{self, chunk_message, format_date, format_draw_list};
use crate::bot::telegram::Messenger;
use crate::chart::ChartRenderer;
use crate::draws::DrawService;
use crate::error::{AppError, Result};
use crate::types::{Message, Update};

/// Routes chat commands to the draw pipeline and sends the replies.
pub struct Dispatcher {
    draws: DrawService,
    renderer: Arc<dyn ChartRenderer>,
    messenger: Arc<dyn Messenger>,
    health: Arc<HealthState>,
}

impl Dispatcher {
    pub fn new(
        draws: DrawService,
        renderer: Arc<dyn ChartRenderer>,
        messenger: Arc<dyn Messenger>,
        health: Arc<HealthState>,
    ) -> Self {
        Self { draws, renderer, messenger, health }
    }

    pub async fn handle_update(&self, update: Update) {
        self.health.inc_updates_received();

        let Some(msg) = update.message else {
            debug!(update_id = update.update_id, "[DISPATCH] update without message");
            return;
        };
        log_interaction(&msg);

        let Some(cmd) = msg.text.as_deref().and_then(commands::parse) else {
            return;
        };

        let chat_id = msg.chat.id;
        if let Err(e) = self.execute(chat_id, cmd).await {
            error!(chat_id, "[DISPATCH] reply failed: {e}");
        }
        self.health.inc_commands_handled();
    }

    /// Run one command. Pipeline failures become reply text; only
    /// messenger errors are returned.
    pub async fn execute(&self, chat_id: i64, cmd: Command) -> Result<()> {
        match cmd {
            Command::Start => self.reply(chat_id, &format::welcome(self.draws.classifier())).await,
            Command::Help => self.reply(chat_id, &format::help(self.draws.classifier())).await,
            Command::Draws { count } => self.latest_draws(chat_id, count).await,
            Command::FilterDraws { code, count } => self.filter_draws(chat_id, &code, count).await,
            Command::CrsTrend { count } => self.crs_trend(chat_id, count).await,
            Command::Usage(usage) => self.reply(chat_id, usage).await,
            Command::Unknown(name) => {
                debug!(chat_id, command = %name, "[DISPATCH] unknown command");
                self.reply(chat_id, format::UNKNOWN_COMMAND).await
            }
        }
    }

    async fn latest_draws(&self, chat_id: i64, count: usize) -> Result<()> {
        let draws = match self.draws.require_draws(count).await {
            Ok(d) => d,
            Err(e) => return self.reply(chat_id, failure_text(&e)).await,
        };
        let header = format!("Latest {} Express Entry draws:", draws.len());
        self.reply(chat_id, &format_draw_list(&header, &draws)).await
    }

    async fn filter_draws(&self, chat_id: i64, code: &str, count: usize) -> Result<()> {
        let program = match self.draws.resolve_program(code) {
            Ok(p) => p,
            Err(_) => {
                warn!(chat_id, code, "[DISPATCH] unknown filter code");
                let text = format::unknown_program(code, self.draws.classifier());
                return self.reply(chat_id, &text).await;
            }
        };

        let result = match self.draws.filter_draws(code, count).await {
            Ok(r) => r,
            Err(e) => return self.reply(chat_id, failure_text(&e)).await,
        };

        info!(
            chat_id,
            program,
            primary = result.primary_matches.len(),
            subclass = result.subclass_matches.len(),
            "[DISPATCH] filter_draws {code}",
        );

        if result.primary_matches.is_empty() && result.subclass_matches.is_empty() {
            let text = format!("No {program} draws found in the last {count} draws.");
            return self.reply(chat_id, &text).await;
        }

        if !result.primary_matches.is_empty() {
            let header = format!(
                "{program}: {} of the last {count} draws",
                result.primary_matches.len()
            );
            self.reply(chat_id, &format_draw_list(&header, &result.primary_matches))
                .await?;
        }

        if !result.subclass_matches.is_empty() {
            let header = format!("Draws listing {program} as a sub-category:");
            self.reply(chat_id, &format_draw_list(&header, &result.subclass_matches))
                .await?;
        }
        Ok(())
    }

    /// Text listing first, then the chart. A failed render only adds an
    /// apology; the listing has already gone out.
    async fn crs_trend(&self, chat_id: i64, count: usize) -> Result<()> {
        let draws = match self.draws.require_draws(count).await {
            Ok(d) => d,
            Err(e) => return self.reply(chat_id, failure_text(&e)).await,
        };

        let header = format!("Last {} Express Entry draws:", draws.len());
        self.reply(chat_id, &format_draw_list(&header, &draws)).await?;

        let series = analyze_rolling_average(&draws, None);
        if let Some(reason) = series.insufficiency() {
            info!(chat_id, samples = series.samples, "[DISPATCH] not enough CRS data to chart");
            return self.reply(chat_id, &format::insufficient_data(reason)).await;
        }

        let mut chronological = draws;
        sort_chronological(&mut chronological);

        let title = format!("Express Entry CRS – {}-draw rolling average", series.window);
        let caption = match (chronological.first(), chronological.last()) {
            (Some(first), Some(last)) => format!(
                "Rolling average CRS, {} to {}",
                format_date(first.date),
                format_date(last.date)
            ),
            _ => "Rolling average CRS".to_string(),
        };

        match self.renderer.render(&chronological, &series.points, &title).await {
            Ok(png) => self.messenger.send_photo(chat_id, png, &caption).await,
            Err(e) => {
                warn!(chat_id, "[CHART] {e}");
                self.reply(chat_id, format::CHART_FAILED).await
            }
        }
    }

    async fn reply(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in chunk_message(text) {
            self.messenger.send_text(chat_id, &chunk).await?;
        }
        Ok(())
    }
}

fn failure_text(e: &AppError) -> &'static str {
    match e {
        AppError::NoValidDraws => format::NO_DRAWS,
        other => {
            warn!("[DISPATCH] draw request failed: {other}");
            format::FEED_UNAVAILABLE
        }
    }
}

fn log_interaction(msg: &Message) {
    let (user_id, user_name) = msg
        .from
        .as_ref()
        .map(|u| (u.id, u.display_name()))
        .unwrap_or_default();
    info!(
        chat_id = msg.chat.id,
        user_id,
        user = %user_name,
        text = msg.text.as_deref().unwrap_or(""),
        "User interaction - chat {} user {} ({}): {}",
        msg.chat.id,
        user_id,
        user_name,
        msg.text.as_deref().unwrap_or(""),
    );
}
