//! Line-oriented review console.
//!
//! Each input line is one operator command; a status line for the current
//! picture is printed after every command that moves or changes it.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use photo_triage_core::commit::CommitEngine;
use photo_triage_core::metadata::MetadataProvider;
use photo_triage_core::rating::RatingStore;
use photo_triage_core::reporter::LogReporter;
use photo_triage_core::working_set::{Move, View, WorkingSet};
use photo_triage_core::{Disposition, Error, PhotoTriage};

const HELP: &str = "\
navigate: first last next prev +N -N goto N
tag:      keep take stitch compare crop delete untag
view:     view full | view compare
other:    drop  rate N  info  commit  rescan  help  quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Move),
    Tag(Disposition),
    View(View),
    Drop,
    Rate(i32),
    Info,
    Commit,
    Rescan,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or_default();
        let arg = words.next();

        let command = match (head, arg) {
            ("first", None) => Self::Move(Move::First),
            ("last", None) => Self::Move(Move::Last),
            ("next" | "n", None) => Self::Move(Move::By(1)),
            ("prev" | "p", None) => Self::Move(Move::By(-1)),
            ("goto", Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Self::Move(Move::To(n - 1)),
                _ => return Err(format!("goto expects a position from 1, got {:?}", n)),
            },
            (step, None) if step.starts_with('+') || step.starts_with('-') => {
                let delta = step
                    .parse::<isize>()
                    .map_err(|_| format!("bad step {:?}", step))?;
                Self::Move(Move::By(delta))
            }
            ("keep", None) => Self::Tag(Disposition::Keep),
            ("take", None) => Self::Tag(Disposition::Take),
            ("stitch", None) => Self::Tag(Disposition::Stitch),
            ("compare", None) => Self::Tag(Disposition::Compare),
            ("crop", None) => Self::Tag(Disposition::Crop),
            ("delete", None) => Self::Tag(Disposition::Delete),
            ("untag", None) => Self::Tag(Disposition::None),
            ("view", Some("full")) => Self::View(View::Full),
            ("view", Some("compare")) => Self::View(View::Compare),
            ("drop", None) => Self::Drop,
            ("rate", Some(n)) => Self::Rate(
                n.parse()
                    .map_err(|_| format!("rate expects a number, got {:?}", n))?,
            ),
            ("info", None) => Self::Info,
            ("commit", None) => Self::Commit,
            ("rescan", None) => Self::Rescan,
            ("help" | "?", None) => Self::Help,
            ("quit" | "q", None) => Self::Quit,
            _ => return Err(format!("unknown command {:?}, try help", line)),
        };

        if words.next().is_some() {
            return Err(format!("too many arguments in {:?}", line));
        }
        Ok(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Console<'a> {
    triage: &'a PhotoTriage,
    src: PathBuf,
    dst: PathBuf,
    set: WorkingSet,
    ratings: Box<dyn RatingStore>,
    engine: CommitEngine,
}

impl<'a> Console<'a> {
    pub fn open(triage: &'a PhotoTriage, src: PathBuf, dst: PathBuf) -> Result<Self> {
        let set = triage.scan(&src, &mut LogReporter)?;
        Ok(Self {
            triage,
            src,
            dst,
            set,
            ratings: triage.rating_store(),
            engine: triage.commit_engine(),
        })
    }

    pub fn with_ratings(mut self, ratings: Box<dyn RatingStore>) -> Self {
        self.ratings = ratings;
        self
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.set
    }

    pub fn run<I: BufRead, W: Write>(&mut self, input: I, mut out: W) -> Result<()> {
        self.show(&mut out)?;
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if self.execute(command, &mut out)? == Flow::Quit {
                        break;
                    }
                }
                Err(message) => writeln!(out, "{}", message)?,
            }
        }
        Ok(())
    }

    fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        match command {
            Command::Move(movement) => {
                if let Err(e) = self.set.move_cursor(movement) {
                    writeln!(out, "{}", e)?;
                    return Ok(Flow::Continue);
                }
                self.show(out)?;
            }
            Command::Tag(disposition) => self.tag(disposition, out)?,
            Command::View(view) => {
                self.set.switch_view(view == View::Compare);
                self.show(out)?;
            }
            Command::Drop => match self.set.remove_current() {
                Ok(_) => self.show(out)?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            Command::Rate(rating) => {
                let Some(item) = self.set.current_item() else {
                    writeln!(out, "{}", Error::EmptyWorkingSet)?;
                    return Ok(Flow::Continue);
                };
                match self.ratings.set_rating(&item.file_name(), rating) {
                    Ok(()) => writeln!(out, "rated {} {}", item.file_name(), rating)?,
                    Err(e) => writeln!(out, "{}", e)?,
                }
            }
            Command::Info => self.info(out)?,
            Command::Commit => {
                let report = self.engine.commit(&mut self.set, &self.dst, &mut LogReporter);
                writeln!(out, "{}", report)?;
                for failure in &report.failures {
                    writeln!(out, "  {}: {}", failure.path.display(), failure.error)?;
                }
                self.show(out)?;
            }
            Command::Rescan => {
                self.set = self.triage.scan(&self.src, &mut LogReporter)?;
                self.show(out)?;
            }
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => {
                let pending: usize = self
                    .set
                    .tally()
                    .iter()
                    .filter(|(d, _)| **d != Disposition::None)
                    .map(|(_, n)| n)
                    .sum();
                if pending > 0 {
                    writeln!(out, "{} tagged pictures left uncommitted", pending)?;
                }
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Tag the current picture and move on to the next one
    fn tag<W: Write>(&mut self, disposition: Disposition, out: &mut W) -> Result<()> {
        let Some(id) = self.set.current() else {
            writeln!(out, "{}", Error::EmptyWorkingSet)?;
            return Ok(());
        };

        if disposition == Disposition::Compare && self.set.view() == View::Compare {
            self.set.finalize_compare(id);
        } else {
            self.set.set_disposition(id, disposition);
        }

        // Items leaving the compare sequence already moved the cursor
        if self.set.current() == Some(id) {
            let _ = self.set.move_cursor(Move::By(1));
        }
        self.show(out)
    }

    fn show<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let loaded = self
            .set
            .materialize(&mut LogReporter, |item| item.load_dimensions());
        let (id, (width, height)) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                writeln!(out, "{}", e)?;
                return Ok(());
            }
        };

        let item = self.set.item(id);
        let (pos, len) = self.set.position().unwrap_or((0, 0));
        let view = match self.set.view() {
            View::Full => "",
            View::Compare => " compare",
        };
        let rating = match self.ratings.lookup_rating(&item.file_name()) {
            Ok(Some(stars)) => format!(" {}*", stars),
            Ok(None) => String::new(),
            Err(e) => {
                log::debug!("Rating lookup failed for {}: {}", item.file_name(), e);
                String::new()
            }
        };
        writeln!(
            out,
            "[{}/{}{}] {} [{}] {}x{}{}",
            pos,
            len,
            view,
            item.file_name(),
            item.disposition().tag(),
            width,
            height,
            rating
        )?;
        Ok(())
    }

    fn info<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let Some(item) = self.set.current_item() else {
            writeln!(out, "{}", Error::EmptyWorkingSet)?;
            return Ok(());
        };
        writeln!(out, "path:        {}", item.path().display())?;
        writeln!(out, "disposition: {}", item.disposition())?;
        writeln!(out, "rotation:    {}", item.rotation.degrees())?;
        if let Ok(Some(stars)) = self.ratings.lookup_rating(&item.file_name()) {
            writeln!(out, "rating:      {}", stars)?;
        }
        match self.triage.metadata().read_exposure(item.path()) {
            Ok(exposure) if !exposure.is_empty() => writeln!(out, "exposure:    {}", exposure)?,
            Ok(_) => {}
            Err(e) => writeln!(out, "exposure:    unreadable ({})", e)?,
        }
        let tally = self.set.tally();
        let summary: Vec<String> = tally
            .iter()
            .map(|(disposition, n)| format!("{} {}", disposition, n))
            .collect();
        writeln!(out, "working set: {}", summary.join(", "))?;
        Ok(())
    }
}
