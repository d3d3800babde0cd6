//! Clap adapter: parsed [clap](https://docs.rs/clap) matches as a
//! [`FlagStore`].
//!
//! Compiled only with the `clap` Cargo feature (on by default). The core never
//! depends on clap; this module just translates an `ArgMatches` into
//! [`Flag`]s:
//!
//! - a flag is *changed* when its value came from the command line;
//! - `SetTrue`/`SetFalse` flags are `bool`, `Count` flags are `u8`;
//! - `Append` arguments and arguments taking several values become lists;
//! - values whose parsed type is not a known leaf type fall back to their raw
//!   string form.
//!
//! ```ignore
//! let command = Cli::command();
//! let matches = command.clone().get_matches();
//! let flags = ClapFlags::new(&command, &matches);
//! Copre::builder(&mut config).flags(&flags).build()?;
//! ```

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::PathBuf;
use std::time::Duration;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use ipnet::IpNet;
use tracing::trace;

use crate::flags::{Flag, FlagStore};
use crate::leaf::Leaf;
use crate::value::{Ipv4Mask, Value};

/// A clap command definition together with the matches it produced.
///
/// `matches` must come from `command` (or a clone of it).
#[derive(Debug, Clone, Copy)]
pub struct ClapFlags<'a> {
    command: &'a Command,
    matches: &'a ArgMatches,
}

impl<'a> ClapFlags<'a> {
    pub fn new(command: &'a Command, matches: &'a ArgMatches) -> Self {
        Self { command, matches }
    }

    fn flag(&self, arg: &Arg) -> Option<Flag> {
        if matches!(
            arg.get_action(),
            ArgAction::Help | ArgAction::HelpShort | ArgAction::HelpLong | ArgAction::Version
        ) {
            return None;
        }
        let id = arg.get_id().as_str();
        let source = self.matches.value_source(id)?;
        let multiple = matches!(arg.get_action(), ArgAction::Append)
            || arg.get_num_args().is_some_and(|range| range.max_values() > 1);
        let value = if multiple {
            many(self.matches, id)
        } else {
            one(self.matches, id)
        };
        let Some(value) = value else {
            trace!(flag = id, "flag value has no leaf representation");
            return None;
        };
        Some(Flag {
            name: id.to_string(),
            value,
            changed: source == ValueSource::CommandLine,
        })
    }
}

impl FlagStore for ClapFlags<'_> {
    fn flags(&self) -> Vec<Flag> {
        self.command
            .get_arguments()
            .filter_map(|arg| self.flag(arg))
            .collect()
    }
}

/// Try each known leaf type in turn; clap stores values type-erased.
macro_rules! downcast {
    ($matches:expr, $id:expr, $getter:ident, $convert:expr; $($ty:ty),* $(,)?) => {$(
        if let Ok(Some(found)) = $matches.$getter::<$ty>($id) {
            return $convert(found);
        }
    )*};
}

fn one(matches: &ArgMatches, id: &str) -> Option<Value> {
    downcast!(matches, id, try_get_one, |v: &_| Leaf::to_value(v);
        String, bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64,
        PathBuf, IpAddr, Ipv4Addr, Ipv6Addr, IpNet, Ipv4Mask, Duration);
    let mut raw = matches.try_get_raw(id).ok()??;
    raw.next()
        .map(|s| Value::String(s.to_string_lossy().into_owned()))
}

fn many(matches: &ArgMatches, id: &str) -> Option<Value> {
    fn list<'a, T: Leaf + 'a>(values: impl Iterator<Item = &'a T>) -> Option<Value> {
        values
            .map(Leaf::to_value)
            .collect::<Option<Vec<_>>>()
            .map(Value::List)
    }
    downcast!(matches, id, try_get_many, list;
        String, bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64,
        PathBuf, IpAddr, Ipv4Addr, Ipv6Addr, IpNet, Ipv4Mask, Duration);
    let raw = matches.try_get_raw(id).ok()??;
    Some(Value::List(
        raw.map(|s| Value::String(s.to_string_lossy().into_owned()))
            .collect(),
    ))
}
