//! Cue sheet parsing.
//!
//! A cue sheet lists one or more audio files (`FILE`) and, per file, the
//! tracks it contains with their `INDEX` marks in `MM:SS:FF` (75 frames per
//! second). Only the commands the music catalog uses are kept: `TITLE`,
//! `PERFORMER`, `FILE`, `TRACK` and `INDEX`. Everything else (`REM`,
//! `CATALOG`, `FLAGS`, `ISRC`, `PREGAP`, ...) is accepted and ignored.
//!
//! Parsing is line oriented; each line is parsed with nom.

pub mod segment;

use async_trait::async_trait;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{take_till, take_while1},
    character::complete::{char, digit1, space0, space1},
    combinator::{map, map_res, rest},
    sequence::{delimited, preceded, tuple},
};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// A position inside an audio file, in CD frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueTime {
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueIndex {
    /// 0 = pre-gap start, 1 = track start
    pub number: u32,
    pub time: CueTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CueTrack {
    pub number: u32,
    pub title: Option<String>,
    pub performer: Option<String>,
    pub indexes: Vec<CueIndex>,
}

impl CueTrack {
    pub fn index(&self, number: u32) -> Option<CueTime> {
        self.indexes
            .iter()
            .find(|i| i.number == number)
            .map(|i| i.time)
    }
}

/// One `FILE` block: the referenced audio file and its tracks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CueFile {
    /// As written in the sheet, relative to the sheet's directory
    pub name: String,
    pub tracks: Vec<CueTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CueSheet {
    pub title: Option<String>,
    pub performer: Option<String>,
    pub files: Vec<CueFile>,
}

impl CueSheet {
    pub fn track_count(&self) -> usize {
        self.files.iter().map(|f| f.tracks.len()).sum()
    }
}

/// Syntax error at a specific line of a sheet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct CueParseError {
    pub line: usize,
    pub message: String,
}

impl CueParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Reads and parses a cue sheet from disk.
#[async_trait]
pub trait CueReader: Send + Sync {
    async fn read_sheet(&self, path: &Path) -> Result<CueSheet>;
}

/// [`CueReader`] reading sheets from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCueReader;

#[async_trait]
impl CueReader for FileCueReader {
    async fn read_sheet(&self, path: &Path) -> Result<CueSheet> {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || parse_file(&owned))
            .await
            .map_err(|e| Error::cue(path, format!("cue reader task failed: {e}")))?
    }
}

/// Read and parse a sheet synchronously.
pub fn parse_file(path: &Path) -> Result<CueSheet> {
    let bytes = std::fs::read(path).map_err(|e| Error::cue(path, e.to_string()))?;
    parse_str(&decode(&bytes)).map_err(|e| Error::cue(path, e.to_string()))
}

/// Strip a UTF-8 BOM; sheets in legacy encodings are decoded lossily.
fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Parse cue sheet text.
pub fn parse_str(input: &str) -> std::result::Result<CueSheet, CueParseError> {
    let mut sheet = CueSheet::default();

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let Ok((args, command)) = keyword(line) else {
            debug!(target: "cue", line = line_no, text = %line, "Ignoring line without a command");
            continue;
        };
        let args = args.trim();

        match command.to_ascii_uppercase().as_str() {
            "TITLE" => {
                let value = text_value(args);
                match current_track(&mut sheet) {
                    Some(track) => track.title = Some(value),
                    None => sheet.title = Some(value),
                }
            }
            "PERFORMER" => {
                let value = text_value(args);
                match current_track(&mut sheet) {
                    Some(track) => track.performer = Some(value),
                    None => sheet.performer = Some(value),
                }
            }
            "FILE" => {
                let name = file_name(args);
                if name.is_empty() {
                    return Err(CueParseError::new(line_no, "FILE without a file name"));
                }
                sheet.files.push(CueFile {
                    name,
                    tracks: Vec::new(),
                });
            }
            "TRACK" => {
                let (_, number) = track_header(args)
                    .map_err(|_| CueParseError::new(line_no, format!("bad TRACK '{args}'")))?;
                let file = sheet
                    .files
                    .last_mut()
                    .ok_or_else(|| CueParseError::new(line_no, "TRACK before any FILE"))?;
                file.tracks.push(CueTrack {
                    number,
                    ..Default::default()
                });
            }
            "INDEX" => {
                let (_, index) = index_line(args)
                    .map_err(|_| CueParseError::new(line_no, format!("bad INDEX '{args}'")))?;
                let track = current_track(&mut sheet)
                    .ok_or_else(|| CueParseError::new(line_no, "INDEX outside of a TRACK"))?;
                track.indexes.push(index);
            }
            _ => {}
        }
    }

    Ok(sheet)
}

fn current_track(sheet: &mut CueSheet) -> Option<&mut CueTrack> {
    sheet.files.last_mut().and_then(|f| f.tracks.last_mut())
}

/// Command word at the start of a line.
fn keyword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphabetic())(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_till(|c: char| c == '"'), char('"'))(input)
}

/// `"quoted text"` or the bare remainder of the line.
fn text_value(input: &str) -> String {
    let parsed: IResult<&str, &str> = alt((quoted, rest))(input);
    match parsed {
        Ok((_, value)) => value.trim().to_string(),
        Err(_) => input.trim().to_string(),
    }
}

/// `"name.flac" WAVE` or `name with spaces.flac WAVE`.
fn file_name(args: &str) -> String {
    if let Ok((_, name)) = quoted(args) {
        return name.to_string();
    }
    match args.rsplit_once(|c: char| c.is_whitespace()) {
        Some((name, _file_type)) => name.trim().to_string(),
        None => args.to_string(),
    }
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(input)
}

/// `01 AUDIO`; the track type is not used.
fn track_header(input: &str) -> IResult<&str, u32> {
    let (input, number) = number(input)?;
    let (input, _) = space0(input)?;
    Ok((input, number))
}

/// `MM:SS:FF`
fn cue_time(input: &str) -> IResult<&str, CueTime> {
    map(
        tuple((number, preceded(char(':'), number), preceded(char(':'), number))),
        |(minutes, seconds, frames)| CueTime {
            minutes,
            seconds,
            frames,
        },
    )(input)
}

/// `01 03:45:12`
fn index_line(input: &str) -> IResult<&str, CueIndex> {
    map(
        tuple((number, preceded(space1, cue_time))),
        |(number, time)| CueIndex { number, time },
    )(input)
}
