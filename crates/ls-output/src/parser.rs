//! Line-level parsing of long-format listing output.
//!
//! One call parses one line. Lines that are not shaped like a listing
//! record (blank lines, `total N` headers, truncated or garbled output)
//! are skipped by returning `None`; skipping is part of the contract and
//! never an error.
//!
//! Two date layouts are recognized: the classic `Mon DD HH:MM` /
//! `Mon DD YYYY` columns of GNU coreutils, and the `YYYY-MM-DD HH:MM`
//! column emitted by busybox and toybox `ls`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::entry::{EntryKind, LsEntry};

/// Parses one listing line into an entry, or `None` for non-record lines.
///
/// The entry name is taken as a slice of the original line starting at the
/// first name byte, so interior runs of whitespace in names survive. A
/// symlink arrow (` -> target`) is stripped from the name; the link target
/// itself is discarded.
pub fn parse_line(line: &str) -> Option<LsEntry> {
    let line = line.trim_end();
    if line.is_empty() {
        return None;
    }
    if line.starts_with("total ") || line == "total" {
        tracing::trace!(line, "skipping listing header");
        return None;
    }

    let fields = fields_with_pos(line);
    if fields.len() < 8 {
        return None;
    }

    let perms = fields[0].1;
    let kind = entry_kind(perms)?;
    let is_link = perms.starts_with('l');

    // Hard-link count must be numeric for the line to be a record.
    fields[1].1.parse::<u64>().ok()?;

    // fields[2] and fields[3] are owner and group; not part of the record.
    let size: u64 = fields[4].1.parse().ok()?;

    let (modified, name_index) = parse_date(&fields)?;
    let (name_start, _) = *fields.get(name_index)?;

    let mut name = &line[name_start..];
    if is_link {
        if let Some(arrow) = name.find(" -> ") {
            name = &name[..arrow];
        }
    }
    if name.is_empty() {
        return None;
    }

    Some(match kind {
        EntryKind::Directory => LsEntry::directory(name, size, modified),
        EntryKind::File => LsEntry::file(name, size, modified),
    })
}

/// Splits a line on whitespace, keeping each field's byte offset.
fn fields_with_pos(line: &str) -> Vec<(usize, &str)> {
    let mut fields = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                fields.push((s, &line[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        fields.push((s, &line[s..]));
    }
    fields
}

/// Classifies the permission column, rejecting anything not mode-shaped.
fn entry_kind(perms: &str) -> Option<EntryKind> {
    if perms.len() < 10 {
        return None;
    }
    let mut chars = perms.chars();
    let kind = match chars.next()? {
        'd' => EntryKind::Directory,
        '-' | 'l' | 'c' | 'b' | 's' | 'p' => EntryKind::File,
        _ => return None,
    };
    // Nine permission characters; setuid/sticky variants included. A
    // trailing ACL or security-context marker ('+', '.') is tolerated.
    if !chars
        .take(9)
        .all(|c| matches!(c, 'r' | 'w' | 'x' | 's' | 'S' | 't' | 'T' | '-'))
    {
        return None;
    }
    Some(kind)
}

/// Parses the date columns starting at field 5.
///
/// Returns the timestamp and the index of the first name field.
fn parse_date(fields: &[(usize, &str)]) -> Option<(SystemTime, usize)> {
    let first = fields.get(5)?.1;

    // busybox/toybox layout: YYYY-MM-DD HH:MM[:SS]
    if let Ok(date) = NaiveDate::parse_from_str(first, "%Y-%m-%d") {
        let time = parse_clock(fields.get(6)?.1)?;
        return Some((to_system_time(date.and_time(time)), 7));
    }

    // coreutils layout: Mon DD HH:MM for recent files, Mon DD YYYY otherwise
    let month = month_number(first)?;
    let day: u32 = fields.get(6)?.1.parse().ok()?;
    let third = fields.get(7)?.1;
    let stamp = if let Some(time) = parse_clock(third) {
        // Recent files carry no year; the listing implies the current one.
        let year = Local::now().year();
        NaiveDate::from_ymd_opt(year, month, day)?.and_time(time)
    } else {
        let year: i32 = third.parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?
    };
    Some((to_system_time(stamp), 8))
}

fn parse_clock(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

fn month_number(s: &str) -> Option<u32> {
    let n = match s {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };
    Some(n)
}

/// Interprets a naive listing timestamp as local time.
fn to_system_time(stamp: NaiveDateTime) -> SystemTime {
    let secs = Local
        .from_local_datetime(&stamp)
        .earliest()
        .map(|t| t.timestamp())
        .unwrap_or_else(|| stamp.and_utc().timestamp());
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    } else {
        UNIX_EPOCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directory_line() {
        let entry = parse_line("drwxr-xr-x 2 root root 4096 Jan 1 00:00 sub").unwrap();
        assert_eq!(entry.name(), "sub");
        assert!(entry.is_directory());
        assert_eq!(entry.size(), 4096);
    }

    #[test]
    fn test_parse_file_line() {
        let entry = parse_line("-rw-r--r-- 1 root root 123 Jan 1 00:00 file.txt").unwrap();
        assert_eq!(entry.name(), "file.txt");
        assert!(entry.is_file());
        assert!(!entry.is_directory());
        assert_eq!(entry.size(), 123);
    }

    #[test]
    fn test_parse_year_date_layout() {
        let entry = parse_line("-rw-r--r-- 1 user user 512 Mar 15 2023 notes.md").unwrap();
        assert_eq!(entry.name(), "notes.md");
        assert_eq!(entry.size(), 512);
        // Midnight local time on 2023-03-15; at minimum it is after epoch.
        assert!(entry.modified() > UNIX_EPOCH);
    }

    #[test]
    fn test_parse_busybox_date_layout() {
        let entry =
            parse_line("-rw-rw-rw- 1 media_rw media_rw 8192 2024-02-01 13:45 song.mp3").unwrap();
        assert_eq!(entry.name(), "song.mp3");
        assert_eq!(entry.size(), 8192);
        assert!(entry.modified() > UNIX_EPOCH);
    }

    #[test]
    fn test_parse_busybox_seconds_clock() {
        let entry =
            parse_line("-rw-r--r-- 1 root root 10 2024-02-01 13:45:59 t.log").unwrap();
        assert_eq!(entry.name(), "t.log");
    }

    #[test]
    fn test_total_header_skipped() {
        assert!(parse_line("total 8").is_none());
        assert!(parse_line("total 0").is_none());
    }

    #[test]
    fn test_blank_line_skipped() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
    }

    #[test]
    fn test_garbage_line_skipped() {
        assert!(parse_line("ls: cannot access '/x': No such file or directory").is_none());
        assert!(parse_line("not a listing line at all").is_none());
    }

    #[test]
    fn test_short_line_skipped() {
        assert!(parse_line("-rw-r--r-- 1 root root").is_none());
    }

    #[test]
    fn test_non_numeric_size_skipped() {
        // Character devices list "major, minor" instead of a size.
        assert!(parse_line("crw-rw-rw- 1 root root 1, 3 Jan 1 00:00 null").is_none());
    }

    #[test]
    fn test_name_with_spaces_preserved() {
        let entry =
            parse_line("-rw-r--r-- 1 root root 9 Jan 1 00:00 My  Report final.txt").unwrap();
        assert_eq!(entry.name(), "My  Report final.txt");
    }

    #[test]
    fn test_symlink_arrow_stripped() {
        let entry =
            parse_line("lrwxrwxrwx 1 root root 7 Jan 1 00:00 sdcard -> /mnt/sd").unwrap();
        assert_eq!(entry.name(), "sdcard");
        // Links surface as plain files; link semantics are out of scope.
        assert!(entry.is_file());
    }

    #[test]
    fn test_setuid_and_sticky_bits_accepted() {
        assert!(parse_line("-rwsr-xr-x 1 root root 64 Jan 1 00:00 su").is_some());
        assert!(parse_line("drwxrwxrwt 4 root root 4096 Jan 1 00:00 tmp").is_some());
    }

    #[test]
    fn test_acl_marker_tolerated() {
        let entry = parse_line("-rw-r--r--+ 1 root root 5 Jan 1 00:00 acl.txt").unwrap();
        assert_eq!(entry.name(), "acl.txt");
    }

    #[test]
    fn test_invalid_permission_column_skipped() {
        assert!(parse_line("qrwxr-xr-x 2 root root 4096 Jan 1 00:00 sub").is_none());
        assert!(parse_line("drwxr-qr-x 2 root root 4096 Jan 1 00:00 sub").is_none());
    }

    #[test]
    fn test_non_numeric_link_count_skipped() {
        assert!(parse_line("drwxr-xr-x x root root 4096 Jan 1 00:00 sub").is_none());
    }

    #[test]
    fn test_unknown_month_skipped() {
        assert!(parse_line("-rw-r--r-- 1 root root 123 Foo 1 00:00 f").is_none());
    }

    #[test]
    fn test_padded_columns() {
        // Real ls output pads columns with multiple spaces.
        let entry =
            parse_line("-rw-r--r--  1 root  root     123 Jan  1 00:00 file.txt").unwrap();
        assert_eq!(entry.name(), "file.txt");
        assert_eq!(entry.size(), 123);
    }

    #[test]
    fn test_device_and_socket_types_surface_as_files() {
        let sock = parse_line("srwxrwxrwx 1 root root 0 Jan 1 00:00 app.sock").unwrap();
        assert!(sock.is_file());
        let fifo = parse_line("prw-r--r-- 1 root root 0 Jan 1 00:00 pipe").unwrap();
        assert!(fifo.is_file());
    }
}
