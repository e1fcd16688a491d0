use std::{
    cell::RefCell,
    collections::BTreeSet,
    io::{self, Write as _},
    path::PathBuf,
    time::Duration,
};

use crossterm::{
    cursor,
    event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use heirloom_engine::{
    AchievementId, AnswerPayload, Command, GameHost, ItemId, Phase, PlayStep, RoundEvent,
    RoundItem, RoundSession, Verdict,
};

use crate::{
    command::RoundArg,
    schema::record::{PlayerInfo, RoundRecord},
};

use self::{
    event_loop::{EventLoop, PlayEvent},
    screen::View,
};

mod event_loop;
mod screen;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    #[clap(flatten)]
    round: RoundArg,
    /// Save a record of the round to a file when it completes
    #[arg(long)]
    save_record: bool,
    /// Directory to save record files
    #[arg(long, default_value = "./data/records/")]
    record_dir: PathBuf,
}

/// Restores the terminal when dropped, including on early return.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(err) = execute!(io::stdout(), EnterAlternateScreen, cursor::Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(err);
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// What a key press asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    None,
    Run(Command),
    Exit,
}

/// Input state that lives outside the engine: the partial sequence order and
/// the status line.
#[derive(Debug, Default)]
struct PlayInput {
    order: Vec<ItemId>,
    status: String,
}

impl PlayInput {
    fn handle_key(&mut self, key: KeyEvent, session: &RoundSession) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            return Action::Exit;
        }

        match session.phase() {
            Phase::Intro => Action::None,
            Phase::Results => match key.code {
                KeyCode::Enter | KeyCode::Char('q') => Action::Exit,
                _ => Action::None,
            },
            Phase::Playing(PlayStep::StoryReview { .. }) => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => Action::Run(Command::ContinueStory),
                _ => Action::None,
            },
            Phase::Playing(PlayStep::AwaitingAnswer) => match key.code {
                KeyCode::Char('?') => Action::Run(Command::Hint),
                KeyCode::Backspace => {
                    self.order.pop();
                    Action::None
                }
                KeyCode::Enter if !self.order.is_empty() => Action::Run(Command::Answer(
                    AnswerPayload::Sequence(std::mem::take(&mut self.order)),
                )),
                KeyCode::Char(c) => self.handle_char(c, session),
                _ => Action::None,
            },
        }
    }

    fn handle_char(&mut self, c: char, session: &RoundSession) -> Action {
        if session.board().is_some() {
            return letter_index(c).map_or(Action::None, |index| {
                Action::Run(Command::Answer(AnswerPayload::Flip(index)))
            });
        }
        match session.current_item() {
            Some(RoundItem::Choice(item)) => c
                .to_digit(10)
                .and_then(|digit| usize::try_from(digit).ok()?.checked_sub(1))
                .and_then(|index| item.options.get(index))
                .map_or(Action::None, |option| {
                    Action::Run(Command::Answer(AnswerPayload::Choice(option.clone())))
                }),
            Some(RoundItem::Sequence(item)) => {
                let Some(event) = letter_index(c).and_then(|index| item.events.get(index)) else {
                    return Action::None;
                };
                if !self.order.contains(&event.id) {
                    self.order.push(event.id.clone());
                }
                // A complete order is submitted without waiting for Enter.
                if self.order.len() == item.events.len() {
                    let order = std::mem::take(&mut self.order);
                    return Action::Run(Command::Answer(AnswerPayload::Sequence(order)));
                }
                Action::None
            }
            Some(RoundItem::Pair(_)) | None => Action::None,
        }
    }

    /// Summarizes what the engine reported for the status line.
    fn observe(&mut self, events: &[RoundEvent]) {
        for event in events {
            let status = match event {
                RoundEvent::Answered(outcome) => match outcome.verdict {
                    Verdict::Correct => format!("Correct! +{}", outcome.points),
                    Verdict::Wrong => "Not quite.".to_owned(),
                    Verdict::TimedOut => "Time's up.".to_owned(),
                    Verdict::Malformed => "That answer was not understood.".to_owned(),
                },
                RoundEvent::PairMatched { points, .. } => format!("Match! +{points}"),
                RoundEvent::PairMismatched { .. } => "No match.".to_owned(),
                RoundEvent::HintApplied { remaining } => {
                    format!("Hint used: {remaining}s left. Take your time.")
                }
                RoundEvent::Rejected(_) => "That card can't be turned.".to_owned(),
                RoundEvent::Expired => "Time's up.".to_owned(),
                RoundEvent::Completed(_) => "Press Enter to finish.".to_owned(),
                RoundEvent::ItemPresented { .. } => {
                    self.order.clear();
                    continue;
                }
                RoundEvent::Started { .. }
                | RoundEvent::Tick { .. }
                | RoundEvent::CardRevealed { .. }
                | RoundEvent::StoryReview { .. } => continue,
            };
            self.status = status;
        }
    }
}

fn letter_index(c: char) -> Option<usize> {
    if !c.is_ascii_lowercase() {
        return None;
    }
    let byte = u8::try_from(c).ok()?;
    Some(usize::from(byte - b'a'))
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        round,
        save_record,
        record_dir,
    } = arg;

    let archive = round.load_archive()?;
    let table = round.load_table()?;
    let seed = round.seed();

    let earned: RefCell<Option<BTreeSet<AchievementId>>> = RefCell::new(None);
    let mut host = GameHost::new(&archive, |_, ids| {
        *earned.borrow_mut() = Some(ids.clone());
    })
    .with_table(table)
    .with_options(round.options());
    host.start_round(round.variant, round.tier, seed)?;
    tracing::debug!(%seed, "interactive round started");

    {
        let _guard = TerminalGuard::enter()?;
        let mut out = io::stdout().lock();
        let mut input = PlayInput::default();
        let mut events = EventLoop::new(TICK_INTERVAL);

        while let Some(session) = host.round() {
            let achievements = earned.borrow();
            screen::draw(
                &mut out,
                &View {
                    session,
                    order: &input.order,
                    status: &input.status,
                    achievements: achievements.as_ref(),
                },
            )?;
            drop(achievements);

            let reported = match events.next()? {
                PlayEvent::Tick => host.tick(),
                PlayEvent::Terminal(Event::Key(key)) => match input.handle_key(key, session) {
                    Action::None => vec![],
                    Action::Run(command) => host.process_turn([command], false),
                    Action::Exit => break,
                },
                PlayEvent::Terminal(_) => vec![],
            };
            if reported.iter().any(RoundEvent::is_item_presented) {
                events.reset();
            }
            input.observe(&reported);
        }
        out.flush()?;
    }

    let Some(session) = host.round().filter(|session| session.phase().is_results()) else {
        if host.quit() {
            eprintln!("Round abandoned; nothing recorded.");
        }
        return Ok(());
    };
    let achievements = earned.borrow_mut().take().unwrap_or_default();
    let record = RoundRecord::new(seed, PlayerInfo::Manual, session, achievements);
    if let Some(record) = record {
        eprintln!(
            "Score {} ({} of {} correct)",
            record.result.score, record.result.correct_count, record.result.total_count
        );
        if *save_record {
            record.save(record_dir)?;
        }
    }
    Ok(())
}
