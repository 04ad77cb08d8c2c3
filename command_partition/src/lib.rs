//! Partitioning of variadic command-line arguments into batches that respect a
//! maximum command length.
//!
//! Operating systems bound the byte length of the argument vector a process
//! can be spawned with (`ARG_MAX` on POSIX). Callers that forward an arbitrary
//! number of file paths to a subprocess therefore have to split the paths over
//! several invocations of the same command, the way `xargs(1)` does.
//!
//! [`partition`] performs only the splitting. It is a pure function so that
//! batching behavior can be tested without spawning anything; executing the
//! returned chunks and aggregating their results is up to the caller, as is
//! choosing the maximum length for the target platform.

use std::{error, fmt};

/// A single variadic argument that does not fit within the maximum command
/// length, even as the only argument of its chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentTooLong {
    pub argument: String,
    pub max_length: usize,
}

impl error::Error for ArgumentTooLong {}

impl fmt::Display for ArgumentTooLong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "argument of {} bytes does not fit in a command of at most {} bytes: {:?}",
            self.argument.len(),
            self.max_length,
            self.argument,
        )
    }
}

/// Byte length of `args` joined with a single space.
pub fn joined_length(args: &[&str]) -> usize {
    let bytes: usize = args.iter().map(|arg| arg.len()).sum();
    bytes + args.len().saturating_sub(1)
}

/// Splits `varargs` into ordered chunks, each prefixed with `command`, such
/// that the space-joined byte length of every chunk stays within `max_length`.
///
/// Every chunk contains at least one vararg (except when `varargs` is empty,
/// which yields exactly one chunk consisting of `command` alone), varargs keep
/// their relative order, and concatenating the varargs of all chunks restores
/// the input. Each vararg is accounted as its byte length plus one separator.
///
/// The fixed `command` prefix is never split; a `max_length` smaller than the
/// prefix itself fails on the first vararg.
pub fn partition<'a>(
    command: &[&'a str],
    varargs: &[&'a str],
    max_length: usize,
) -> Result<Vec<Vec<&'a str>>, ArgumentTooLong> {
    let command_length = joined_length(command);

    let mut chunks = Vec::new();
    let mut current = command.to_vec();
    let mut current_length = command_length;

    for &arg in varargs {
        let arg_length = arg.len() + 1;
        if current_length + arg_length <= max_length {
            current.push(arg);
            current_length += arg_length;
            continue;
        }
        if current.len() == command.len() {
            // The chunk holds no varargs yet, so a fresh chunk would not help.
            return Err(ArgumentTooLong {
                argument: arg.to_owned(),
                max_length,
            });
        }
        chunks.push(std::mem::replace(&mut current, command.to_vec()));
        current_length = command_length;
        if current_length + arg_length > max_length {
            return Err(ArgumentTooLong {
                argument: arg.to_owned(),
                max_length,
            });
        }
        current.push(arg);
        current_length += arg_length;
    }
    chunks.push(current);

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_length_matches_space_joined_string() {
        let args = ["docker", "run", "--rm"];
        assert_eq!(joined_length(&args), "docker run --rm".len());
        assert_eq!(joined_length(&[]), 0);
        assert_eq!(joined_length(&["x"]), 1);
    }

    #[test]
    fn small_batch_is_a_single_chunk() {
        let chunks = partition(&["lint", "--fix"], &["a.py", "b.py"], 4096).unwrap();
        assert_eq!(chunks, vec![vec!["lint", "--fix", "a.py", "b.py"]]);
    }

    #[test]
    fn empty_varargs_yield_one_chunk_of_just_the_command() {
        let chunks = partition(&["docker", "ps"], &[], 4096).unwrap();
        assert_eq!(chunks, vec![vec!["docker", "ps"]]);
    }

    #[test]
    fn oversized_batch_splits_preserving_order() {
        // "run" is 3 bytes, each vararg costs 5, so two varargs per chunk.
        let chunks = partition(&["run"], &["aaaa", "bbbb", "cccc", "dddd", "eeee"], 13).unwrap();
        assert_eq!(
            chunks,
            vec![
                vec!["run", "aaaa", "bbbb"],
                vec!["run", "cccc", "dddd"],
                vec!["run", "eeee"],
            ]
        );
    }

    #[test]
    fn chunk_lengths_stay_within_the_maximum() {
        let varargs: Vec<String> = (0..100).map(|n| format!("file-{n:03}.py")).collect();
        let varargs: Vec<&str> = varargs.iter().map(String::as_str).collect();
        let chunks = partition(&["cmd", "--flag"], &varargs, 64).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(&chunk[..2], &["cmd", "--flag"]);
            assert!(joined_length(chunk) <= 64);
        }
        let rejoined: Vec<&str> = chunks
            .iter()
            .flat_map(|chunk| &chunk[2..])
            .copied()
            .collect();
        assert_eq!(rejoined, varargs);
    }

    #[test]
    fn exact_fit_is_not_split() {
        // "ab cd ef" is exactly 8 bytes.
        let chunks = partition(&["ab"], &["cd", "ef"], 8).unwrap();
        assert_eq!(chunks, vec![vec!["ab", "cd", "ef"]]);

        // One byte less forces a second chunk.
        let chunks = partition(&["ab"], &["cd", "ef"], 7).unwrap();
        assert_eq!(chunks, vec![vec!["ab", "cd"], vec!["ab", "ef"]]);
    }

    #[test]
    fn single_argument_that_can_never_fit_is_an_error() {
        let error = partition(&["run"], &["0123456789abcdef"], 10).unwrap_err();
        assert_eq!(error.argument, "0123456789abcdef");
        assert_eq!(error.max_length, 10);
    }

    #[test]
    fn oversized_argument_after_a_full_chunk_is_an_error() {
        let error = partition(&["run"], &["aaaa", "0123456789abcdef"], 10).unwrap_err();
        assert_eq!(error.argument, "0123456789abcdef");
    }

    #[test]
    fn arguments_are_accounted_in_bytes_not_characters() {
        // "é" is one character but two bytes; with the +1 separator it needs
        // a budget of three.
        assert!(partition(&[], &["é"], 2).is_err());
        assert!(partition(&[], &["é"], 3).is_ok());
    }

    #[test]
    fn display_names_the_offending_argument() {
        let error = partition(&["run"], &["0123456789abcdef"], 10).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("16 bytes"));
        assert!(message.contains("0123456789abcdef"));
    }
}
