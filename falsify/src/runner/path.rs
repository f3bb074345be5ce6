use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::runner::tosser::LazyValue;
use crate::stream::Stream;
use crate::value::Value;

/// Colon-separated indices locating a value in the search tree.
///
/// The first segment indexes the candidate stream; each later one indexes
/// the shrinks of the value reached so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayPath {
    segments: Vec<usize>,
}

impl ReplayPath {
    pub fn new(segments: Vec<usize>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[usize] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the path goes past the candidate stream into shrinks
    pub fn has_shrinks(&self) -> bool {
        self.segments.len() > 1
    }

    /// Append `path` to `self`. The last segment of `self` and the first of
    /// `path` address the same stream, so they are summed.
    pub fn merge(&self, path: &[usize]) -> ReplayPath {
        let Some((&last, prefix)) = self.segments.split_last() else {
            return ReplayPath::new(path.to_vec());
        };
        let mut segments = prefix.to_vec();
        match path.split_first() {
            Some((&first, rest)) => {
                segments.push(last + first);
                segments.extend_from_slice(rest);
            }
            None => segments.push(last),
        }
        ReplayPath::new(segments)
    }
}

impl FromStr for ReplayPath {
    type Err = ConfigError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        if path.is_empty() {
            return Ok(Self::default());
        }
        path.split(':')
            .map(|segment| segment.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
            .map_err(|_| ConfigError::InvalidPath {
                path: path.to_string(),
            })
    }
}

impl fmt::Display for ReplayPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str(":")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Re-enter the search tree at `path`.
///
/// Skipped candidates are dropped without being generated. The returned
/// stream starts at the addressed value and continues with its later
/// siblings.
pub fn path_walk<'a, T: 'a, S>(
    path: &ReplayPath,
    producers: Stream<'a, LazyValue<'a, T>>,
    shrink: &S,
) -> Result<Stream<'a, LazyValue<'a, T>>, ConfigError>
where
    S: Fn(&Value<T>) -> Stream<'a, Value<T>>,
{
    let Some((&first, rest)) = path.segments().split_first() else {
        return Ok(producers);
    };
    let mut values: Stream<'a, Value<T>> = producers.skip(first).map(LazyValue::force);
    for &segment in rest {
        let head = values
            .nth_or_last(0)
            .ok_or_else(|| ConfigError::PathHeadMissing {
                path: path.to_string(),
            })?;
        values = shrink(&head).skip(segment);
    }
    Ok(values.map(LazyValue::ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::shrink_towards_zero;
    use std::cell::Cell;
    use std::rc::Rc;

    fn path(s: &str) -> ReplayPath {
        s.parse().unwrap()
    }

    fn shrink(value: &Value<u64>) -> Stream<'static, Value<u64>> {
        Stream::new(shrink_towards_zero(**value.raw()).map(|n| Value::new(n, None)))
    }

    fn candidates(values: Vec<u64>, forced: &Rc<Cell<usize>>) -> Stream<'static, LazyValue<'static, u64>> {
        let forced = Rc::clone(forced);
        Stream::of(values).map(move |n| {
            let forced = Rc::clone(&forced);
            LazyValue::new(move || {
                forced.set(forced.get() + 1);
                Value::new(n, None)
            })
        })
    }

    fn raw<'a>(stream: Stream<'a, LazyValue<'a, u64>>) -> Vec<u64> {
        stream.map(|lazy| **lazy.force().raw()).collect()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(path("").segments(), &[] as &[usize]);
        assert_eq!(path("4").segments(), &[4]);
        assert_eq!(path("4:0:12").segments(), &[4, 0, 12]);
        assert_eq!(path("4:0:12").to_string(), "4:0:12");
        assert!(path("4:0").has_shrinks());
        assert!(!path("4").has_shrinks());
    }

    #[test]
    fn test_parse_rejects_malformed_paths() {
        for bad in ["a", "1::2", "1:", ":1", "-1", "1:x"] {
            assert_eq!(
                bad.parse::<ReplayPath>(),
                Err(ConfigError::InvalidPath {
                    path: bad.to_string()
                }),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_merge() {
        assert_eq!(path("").merge(&[3, 1]), path("3:1"));
        assert_eq!(path("5").merge(&[3, 1]), path("8:1"));
        assert_eq!(path("5:2").merge(&[0, 4]), path("5:2:4"));
        assert_eq!(path("5:2").merge(&[]), path("5:2"));
    }

    #[test]
    fn test_empty_path_keeps_the_producers() {
        let forced = Rc::new(Cell::new(0));
        let walked = path_walk(&path(""), candidates(vec![1, 2], &forced), &shrink).unwrap();
        assert_eq!(raw(walked), vec![1, 2]);
    }

    #[test]
    fn test_walk_drops_without_forcing() {
        let forced = Rc::new(Cell::new(0));
        let walked = path_walk(&path("2"), candidates(vec![10, 20, 30, 40], &forced), &shrink).unwrap();
        assert_eq!(forced.get(), 0);
        assert_eq!(raw(walked), vec![30, 40]);
        assert_eq!(forced.get(), 2);
    }

    #[test]
    fn test_walk_into_shrinks() {
        let forced = Rc::new(Cell::new(0));
        // 150 shrinks to [0, 75, 113, ...]; 113 shrinks to [0, 57, 85, 99, ...]
        let walked = path_walk(&path("1:2:3"), candidates(vec![7, 150], &forced), &shrink).unwrap();
        let values = raw(walked);
        assert_eq!(values[0], 99);
        assert_eq!(values.last(), Some(&112));
    }

    #[test]
    fn test_walk_past_the_end_is_reported() {
        let forced = Rc::new(Cell::new(0));
        let result = path_walk(&path("5:0"), candidates(vec![1, 2], &forced), &shrink);
        assert_eq!(
            result.map(|_| ()).unwrap_err(),
            ConfigError::PathHeadMissing {
                path: "5:0".to_string()
            }
        );
    }
}
