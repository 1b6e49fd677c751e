//! Terminal workout runner: renders session snapshots and maps keys to
//! session operations.

use anyhow::Result;
use crossterm::event::{self, KeyCode, KeyEventKind};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, Paragraph},
};
use std::time::Duration;

use fitkage::models::{WorkoutPlan, WorkoutSessionRecord, format_duration_ms};
use fitkage::session::{Session, SessionPhase, SessionSnapshot};

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const WORKOUT_HELP: &str =
    "c: complete set | s: skip rest | p: pause/resume | +: more rest | f: finish | q: quit";
const SUMMARY_HELP: &str = "1-5: rate | 0: clear rating | Enter: save | q: quit without saving";

struct SummaryScreen {
    record: WorkoutSessionRecord,
    status_message: String,
}

enum Screen {
    Workout,
    Summary(SummaryScreen),
}

fn header(title: String) -> Paragraph<'static> {
    Paragraph::new(title)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL))
}

fn footer(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).title("Keys"))
}

fn phase_color(phase: SessionPhase) -> Color {
    match phase {
        SessionPhase::Active => Color::Green,
        SessionPhase::Resting => Color::Yellow,
        SessionPhase::Paused => Color::Magenta,
        SessionPhase::Idle | SessionPhase::Completed => Color::Gray,
    }
}

fn draw_workout(frame: &mut Frame, plan_name: &str, snapshot: &SessionSnapshot) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(6),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .split(frame.area());

    frame.render_widget(
        header(format!(
            "{} - {} - {}",
            plan_name,
            format_duration_ms(snapshot.elapsed_ms),
            snapshot.progress_label()
        )),
        chunks[0],
    );

    let current = match &snapshot.current_exercise {
        Some(entry) => {
            let mut lines = vec![
                entry.exercise.name.clone(),
                String::new(),
                format!("Set {} of {}", snapshot.current_set, entry.sets),
                format!("Target: {} reps", entry.reps),
            ];
            if let Some(target) = &entry.exercise.target {
                lines.push(format!("Muscle: {}", target));
            }
            if let Some(equipment) = &entry.exercise.equipment {
                lines.push(format!("Equipment: {}", equipment));
            }
            lines.join("\n")
        }
        None => "No exercise".to_string(),
    };
    let body = Paragraph::new(current)
        .style(Style::default().fg(phase_color(snapshot.phase)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Exercise {} - {}", snapshot.exercise_index + 1, snapshot.phase)),
        );
    frame.render_widget(body, chunks[1]);

    draw_rest(frame, chunks[2], snapshot);

    let next = snapshot
        .next_exercise
        .as_ref()
        .map(|entry| format!("{} ({} x {})", entry.exercise.name, entry.sets, entry.reps))
        .unwrap_or_else(|| "Last exercise".to_string());
    let next_widget = Paragraph::new(next)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL).title("Next"));
    frame.render_widget(next_widget, chunks[3]);

    frame.render_widget(footer(WORKOUT_HELP), chunks[4]);
}

fn draw_rest(frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    let resting = matches!(snapshot.phase, SessionPhase::Resting | SessionPhase::Paused)
        && snapshot.rest_remaining_secs > 0;
    if !resting {
        let idle = Paragraph::new("Go!").block(Block::default().borders(Borders::ALL).title("Rest"));
        frame.render_widget(idle, area);
        return;
    }
    let full = snapshot
        .current_exercise
        .as_ref()
        .map(|entry| entry.rest_seconds)
        .unwrap_or_default()
        .max(snapshot.rest_remaining_secs)
        .max(1);
    let ratio = f64::from(snapshot.rest_remaining_secs) / f64::from(full);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Rest"))
        .gauge_style(Style::default().fg(Color::Yellow))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{}s", snapshot.rest_remaining_secs));
    frame.render_widget(gauge, area);
}

fn draw_summary(frame: &mut Frame, summary: &SummaryScreen) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .split(frame.area());

    frame.render_widget(header("Workout complete".to_string()), chunks[0]);

    let body = Paragraph::new(summary.record.share_text())
        .block(Block::default().borders(Borders::ALL).title("Summary"));
    frame.render_widget(body, chunks[1]);

    let status = Paragraph::new(summary.status_message.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, chunks[2]);

    frame.render_widget(footer(SUMMARY_HELP), chunks[3]);
}

/// Runs `plan` until the user saves the summary (returned) or quits (`None`).
pub async fn run_workout(
    mut terminal: DefaultTerminal,
    session: &Session,
    plan: &WorkoutPlan,
) -> Result<Option<WorkoutSessionRecord>> {
    session.start_workout(plan).await;
    let mut screen = Screen::Workout;

    loop {
        if matches!(screen, Screen::Workout) && session.phase() == SessionPhase::Completed {
            if let Some(record) = session.summary().await {
                screen = Screen::Summary(SummaryScreen {
                    record,
                    status_message: "Rate your workout, then press Enter to save".to_string(),
                });
            }
        }

        let snapshot = session.snapshot();
        terminal.draw(|frame| match &screen {
            Screen::Workout => draw_workout(frame, &plan.name, &snapshot),
            Screen::Summary(summary) => draw_summary(frame, summary),
        })?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let event::Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match &mut screen {
            Screen::Workout => match key.code {
                KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Enter => session.complete_set(),
                KeyCode::Char('s') | KeyCode::Char('S') => session.skip_rest(),
                KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') => {
                    session.toggle_pause()
                }
                KeyCode::Char('+') => session.extend_rest(),
                KeyCode::Char('f') | KeyCode::Char('F') => {
                    session.finish_workout().await;
                }
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(None),
                _ => {}
            },
            Screen::Summary(summary) => match key.code {
                KeyCode::Char(c @ '0'..='5') => {
                    let rating = c as u8 - b'0';
                    match session.set_rating(rating).await {
                        Ok(()) => {
                            summary.record.rating = rating;
                            summary.status_message = format!("Rating set to {}", rating);
                        }
                        Err(e) => summary.status_message = format!("{}", e),
                    }
                }
                KeyCode::Enter => match session.save_session().await {
                    Ok(record) => return Ok(Some(record)),
                    Err(e) => {
                        summary.status_message =
                            format!("Save failed: {}. Press Enter to retry", e);
                    }
                },
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(None),
                _ => {}
            },
        }
    }
}
