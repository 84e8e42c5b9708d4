use std::{
    fs, io,
    path::{Path, PathBuf},
};

use nom::{
    bytes::complete::tag_no_case,
    character::complete::{hex_digit1, multispace0},
    combinator::{all_consuming, opt},
    sequence::{delimited, preceded},
    IResult,
};
use thiserror::Error;

use crate::addr::Addr;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to read trace file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: `{content}` is not a hexadecimal address")]
    Malformed { line: usize, content: String },
    #[error("line {line}: `{content}` does not fit in 32 bits")]
    OutOfRange { line: usize, content: String },
}

pub type Result<T> = std::result::Result<T, TraceError>;

/// Ordered sequence of addresses to replay.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Trace {
    addrs: Vec<Addr>,
}

impl std::ops::Deref for Trace {
    type Target = [Addr];

    fn deref(&self) -> &Self::Target {
        &self.addrs
    }
}

impl FromIterator<Addr> for Trace {
    fn from_iter<T: IntoIterator<Item = Addr>>(iter: T) -> Self {
        Self {
            addrs: iter.into_iter().collect(),
        }
    }
}

fn hex_addr(input: &str) -> IResult<&str, &str> {
    all_consuming(delimited(
        multispace0,
        preceded(opt(tag_no_case("0x")), hex_digit1),
        multispace0,
    ))(input)
}

impl Trace {
    /// parses one address per line. only trailing blank lines are allowed.
    pub fn parse(input: &str) -> Result<Self> {
        let mut addrs = Vec::new();
        for (i, line) in input.trim_end().lines().enumerate() {
            let Ok((_, digits)) = hex_addr(line) else {
                return Err(TraceError::Malformed {
                    line: i + 1,
                    content: line.trim().to_owned(),
                });
            };
            let v = u32::from_str_radix(digits, 16).map_err(|_| TraceError::OutOfRange {
                line: i + 1,
                content: line.trim().to_owned(),
            })?;
            addrs.push(Addr::new(v));
        }
        Ok(Self { addrs })
    }
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TraceError::Io {
            path: path.to_owned(),
            source,
        })?;
        let trace = Self::parse(&content)?;
        log::info!("read {} addresses from {}", trace.len(), path.display());
        Ok(trace)
    }
}
