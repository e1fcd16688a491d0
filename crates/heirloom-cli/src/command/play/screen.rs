use std::{
    collections::BTreeSet,
    io::{self, Write},
};

use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};
use heirloom_engine::{
    AchievementId, CardFace, CardState, ChoicePrompt, ItemId, MatchingBoard, Phase, PlayStep,
    RoundItem, RoundResult, RoundSession,
};

/// Everything one frame shows.
pub(super) struct View<'a> {
    pub session: &'a RoundSession,
    pub order: &'a [ItemId],
    pub status: &'a str,
    pub achievements: Option<&'a BTreeSet<AchievementId>>,
}

/// Label of the `index`-th card or event: `a`, `b`, ...
pub(super) fn label(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .and_then(|index| b'a'.checked_add(index))
        .map_or('?', char::from)
}

pub(super) fn draw<W>(out: &mut W, view: &View<'_>) -> io::Result<()>
where
    W: Write,
{
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    let session = view.session;
    let profile = session.profile();
    line(
        out,
        format_args!(
            "{} ({}, {})",
            profile.variant, profile.tier, profile.score_multiplier
        ),
    )?;

    match session.phase() {
        Phase::Intro => line(out, format_args!("Dealing..."))?,
        Phase::Playing(step) => {
            line(
                out,
                format_args!(
                    "Score {:>5}   Time {:>3}s   Hints {}",
                    session.score(),
                    session.remaining_seconds(),
                    session.state().hints_used()
                ),
            )?;
            line(out, format_args!(""))?;
            match step {
                PlayStep::StoryReview { story_id } => {
                    line(out, format_args!("Story \"{story_id}\" complete."))?;
                    line(out, format_args!("Press Enter to continue."))?;
                }
                PlayStep::AwaitingAnswer => {
                    if let Some(board) = session.board() {
                        draw_board(out, board)?;
                    } else if let Some(item) = session.current_item() {
                        draw_item(out, session, item, view.order)?;
                    }
                }
            }
        }
        Phase::Results => {
            if let Some(result) = session.result() {
                draw_result(out, result, view.achievements)?;
            }
        }
    }

    line(out, format_args!(""))?;
    line(out, format_args!("{}", view.status))?;
    line(out, format_args!(""))?;
    line(
        out,
        format_args!("[?] hint  [Enter] submit/continue  [Backspace] undo  [Esc] quit"),
    )?;
    out.flush()
}

fn line<W>(out: &mut W, args: std::fmt::Arguments<'_>) -> io::Result<()>
where
    W: Write,
{
    write!(out, "{args}\r\n")
}

fn draw_board<W>(out: &mut W, board: &MatchingBoard) -> io::Result<()>
where
    W: Write,
{
    line(
        out,
        format_args!(
            "Pairs {}/{}   Moves {}",
            board.matched_pairs(),
            board.pair_count(),
            board.moves()
        ),
    )?;
    for (index, card) in board.cards().iter().enumerate() {
        let face = match (&card.state, &card.card.face) {
            (CardState::Hidden, _) => "??????".to_owned(),
            (_, CardFace::Photo { photo_id }) => format!("photo {photo_id}"),
            (_, CardFace::Name { name }) => name.clone(),
        };
        let mark = if card.state.is_matched() { "*" } else { " " };
        line(out, format_args!(" {mark}[{}] {face}", label(index)))?;
    }
    Ok(())
}

fn draw_item<W>(
    out: &mut W,
    session: &RoundSession,
    item: &RoundItem,
    order: &[ItemId],
) -> io::Result<()>
where
    W: Write,
{
    let state = session.state();
    line(
        out,
        format_args!(
            "Item {}/{}",
            state.current_index() + 1,
            state.items().len()
        ),
    )?;
    match item {
        RoundItem::Choice(item) => {
            match &item.prompt {
                ChoicePrompt::Photo { photo_id, caption } => {
                    line(out, format_args!("Who is in photo {photo_id}?"))?;
                    if let Some(caption) = caption {
                        line(out, format_args!("  \"{caption}\""))?;
                    }
                }
                ChoicePrompt::StoryBlank {
                    title,
                    context,
                    blank_index,
                    blank_count,
                    ..
                } => {
                    line(
                        out,
                        format_args!("{title} ({}/{blank_count})", blank_index + 1),
                    )?;
                    line(out, format_args!("  ...{context}_____"))?;
                }
            }
            for (index, option) in item.options.iter().enumerate() {
                line(out, format_args!("  {}) {option}", index + 1))?;
            }
        }
        RoundItem::Sequence(item) => {
            line(out, format_args!("Put these in the order they happened:"))?;
            for (index, event) in item.events.iter().enumerate() {
                let picked = order
                    .iter()
                    .position(|id| *id == event.id)
                    .map_or_else(|| "  ".to_owned(), |at| format!("{:>2}", at + 1));
                line(
                    out,
                    format_args!("  {picked} [{}] {}", label(index), event.title),
                )?;
            }
        }
        RoundItem::Pair(_) => {}
    }
    Ok(())
}

fn draw_result<W>(
    out: &mut W,
    result: &RoundResult,
    achievements: Option<&BTreeSet<AchievementId>>,
) -> io::Result<()>
where
    W: Write,
{
    line(out, format_args!("Round complete"))?;
    line(out, format_args!("  Score       {}", result.score))?;
    line(
        out,
        format_args!(
            "  Correct     {}/{}",
            result.correct_count, result.total_count
        ),
    )?;
    line(
        out,
        format_args!(
            "  Time        {}s of {}s",
            result.elapsed_seconds, result.time_budget_seconds
        ),
    )?;
    line(out, format_args!("  Best streak {}", result.best_streak))?;
    if let Some(achievements) = achievements.filter(|ids| !ids.is_empty()) {
        line(out, format_args!(""))?;
        line(out, format_args!("Achievements"))?;
        for id in achievements {
            line(out, format_args!("  {id}"))?;
        }
    }
    Ok(())
}
