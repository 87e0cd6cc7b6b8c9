use crate::attr::Attr;
use crate::destination::{Destination, EmitError, SharedDestination};
use crate::level::Level;
use crate::record::Record;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Destination that forwards every operation to a fixed list of
/// destinations, so that logging to several places looks exactly like
/// logging to one.
///
/// The member list is frozen at construction. [`FanOut::with_attrs`] and
/// [`FanOut::with_group`] build a new handler around derived members and
/// leave the receiver untouched.
#[derive(Clone)]
pub struct FanOut {
    destinations: Arc<[SharedDestination]>,
    /// Errors dropped because an earlier member already failed in the same call.
    suppressed_errors: Arc<AtomicU64>,
}

impl FanOut {
    /// Build a handler over `destinations`, in the given order.
    ///
    /// The handler keeps its own copy of the list. An empty list is valid:
    /// such a handler is never enabled and never emits.
    pub fn new(destinations: &[SharedDestination]) -> Self {
        FanOut {
            destinations: destinations.iter().cloned().collect(),
            suppressed_errors: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    /// Total errors swallowed by this handler and every handler derived from it.
    pub fn suppressed_errors(&self) -> u64 {
        self.suppressed_errors.load(Ordering::Relaxed)
    }

    fn derive(&self, f: impl Fn(SharedDestination) -> SharedDestination) -> FanOut {
        FanOut {
            destinations: self.destinations.iter().cloned().map(f).collect(),
            suppressed_errors: Arc::clone(&self.suppressed_errors),
        }
    }
}

impl Destination for FanOut {
    fn enabled(&self, level: Level) -> bool {
        self.destinations.iter().any(|d| d.enabled(level))
    }

    /// Forward `record` to every member enabled for its level.
    ///
    /// All enabled members are attempted even after a failure. The first
    /// error in member order is returned; later ones are only counted.
    fn emit(&self, record: &Record) -> Result<(), EmitError> {
        let mut first_err: Option<EmitError> = None;
        for destination in self.destinations.iter() {
            if !destination.enabled(record.level()) {
                continue;
            }
            if let Err(e) = destination.emit(record) {
                if first_err.is_none() {
                    first_err = Some(e);
                } else {
                    self.suppressed_errors.fetch_add(1, Ordering::Relaxed);
                    if cfg!(debug_assertions) {
                        eprintln!("fan-out: suppressed additional destination error: {}", e);
                    }
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn with_attrs(self: Arc<Self>, attrs: &[Attr]) -> SharedDestination {
        Arc::new(self.derive(|d| d.with_attrs(attrs)))
    }

    fn with_group(self: Arc<Self>, name: &str) -> SharedDestination {
        Arc::new(self.derive(|d| d.with_group(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::Value;
    use std::sync::Mutex;

    /// What a mock saw: its accumulated attrs/groups plus the record itself.
    #[derive(Debug, Clone)]
    struct Received {
        context: Vec<Attr>,
        record: Record,
    }

    struct Mock {
        threshold: Level,
        fail_with: Option<&'static str>,
        context: Vec<Attr>,
        received: Arc<Mutex<Vec<Received>>>,
    }

    impl Mock {
        fn new(threshold: Level) -> Arc<Mock> {
            Arc::new(Mock {
                threshold,
                fail_with: None,
                context: Vec::new(),
                received: Arc::new(Mutex::new(Vec::new())),
            })
        }

        fn failing(threshold: Level, msg: &'static str) -> Arc<Mock> {
            Arc::new(Mock {
                threshold,
                fail_with: Some(msg),
                context: Vec::new(),
                received: Arc::new(Mutex::new(Vec::new())),
            })
        }

        fn count(&self) -> usize {
            self.received.lock().unwrap().len()
        }

        fn last(&self) -> Received {
            self.received.lock().unwrap().last().cloned().expect("nothing received")
        }

        fn derived(&self, extra: Attr) -> Mock {
            let mut context = self.context.clone();
            context.push(extra);
            Mock {
                threshold: self.threshold,
                fail_with: self.fail_with,
                context,
                received: Arc::clone(&self.received),
            }
        }
    }

    impl Destination for Mock {
        fn enabled(&self, level: Level) -> bool {
            level >= self.threshold
        }

        fn emit(&self, record: &Record) -> Result<(), EmitError> {
            self.received.lock().unwrap().push(Received {
                context: self.context.clone(),
                record: record.clone(),
            });
            match self.fail_with {
                Some(msg) => Err(EmitError::Custom(msg.to_string())),
                None => Ok(()),
            }
        }

        fn with_attrs(self: Arc<Self>, attrs: &[Attr]) -> SharedDestination {
            Arc::new(self.derived(Attr::group("", attrs.to_vec())))
        }

        fn with_group(self: Arc<Self>, name: &str) -> SharedDestination {
            if name.is_empty() {
                return self;
            }
            Arc::new(self.derived(Attr::group(name, Vec::new())))
        }
    }

    fn shared(mocks: &[Arc<Mock>]) -> Vec<SharedDestination> {
        mocks.iter().map(|m| Arc::clone(m) as SharedDestination).collect()
    }

    #[test]
    fn enabled_is_column_wise_or() {
        let thresholds = [Level::Debug, Level::Info, Level::Warn];
        let mocks: Vec<_> = thresholds.iter().map(|l| Mock::new(*l)).collect();
        let fanout = FanOut::new(&shared(&mocks));

        for level in [Level::Debug, Level::Info, Level::Warn, Level::Error] {
            let row: Vec<bool> = mocks.iter().map(|m| m.enabled(level)).collect();
            assert_eq!(fanout.enabled(level), row.iter().any(|b| *b), "level {level}");
        }

        let only_warn = FanOut::new(&shared(&[Mock::new(Level::Warn)]));
        assert!(!only_warn.enabled(Level::Info));
        assert!(only_warn.enabled(Level::Error));
    }

    #[test]
    fn emit_filters_per_destination() {
        let mocks = [Mock::new(Level::Debug), Mock::new(Level::Info), Mock::new(Level::Warn)];
        let fanout = FanOut::new(&shared(&mocks));

        fanout.emit(&Record::new(Level::Info, "hello")).unwrap();

        assert_eq!(mocks[0].count(), 1);
        assert_eq!(mocks[1].count(), 1);
        assert_eq!(mocks[2].count(), 0);
        assert_eq!(mocks[0].last().record.message(), "hello");
    }

    #[test]
    fn first_error_wins_and_delivery_continues() {
        let ok = Mock::new(Level::Debug);
        let bad = Mock::failing(Level::Debug, "E");
        let fanout = FanOut::new(&shared(&[Arc::clone(&ok), Arc::clone(&bad)]));

        let err = fanout.emit(&Record::new(Level::Error, "boom")).unwrap_err();
        assert!(matches!(err, EmitError::Custom(ref m) if m == "E"));
        assert_eq!(ok.count(), 1);
        assert_eq!(bad.count(), 1);

        // A failing member stays in the set.
        assert!(fanout.emit(&Record::new(Level::Error, "again")).is_err());
        assert_eq!(bad.count(), 2);
    }

    #[test]
    fn later_errors_are_suppressed() {
        let first = Mock::failing(Level::Debug, "first");
        let second = Mock::failing(Level::Debug, "second");
        let third = Mock::new(Level::Debug);
        let fanout = FanOut::new(&shared(&[first, second, Arc::clone(&third)]));

        let err = fanout.emit(&Record::new(Level::Info, "x")).unwrap_err();
        assert_eq!(err.to_string(), "first");
        assert_eq!(fanout.suppressed_errors(), 1);
        assert_eq!(third.count(), 1);
    }

    #[test]
    fn with_attrs_propagates_and_leaves_original_untouched() {
        let mocks = [Mock::new(Level::Debug), Mock::new(Level::Info)];
        let original = Arc::new(FanOut::new(&shared(&mocks)));

        let derived = Arc::clone(&original)
            .with_attrs(&[Attr::string("k1", "v1"), Attr::int("k2", 123)]);

        derived.emit(&Record::new(Level::Info, "derived")).unwrap();
        for mock in &mocks {
            let got = mock.last();
            assert_eq!(got.record.message(), "derived");
            let Value::Group(attrs) = &got.context[0].value else {
                panic!("expected attrs group, got {:?}", got.context);
            };
            assert_eq!(attrs[0], Attr::string("k1", "v1"));
            assert_eq!(attrs[1].value, Value::Int(123));
        }

        original.emit(&Record::new(Level::Info, "original")).unwrap();
        for mock in &mocks {
            let got = mock.last();
            assert_eq!(got.record.message(), "original");
            assert!(got.context.is_empty());
        }
    }

    #[test]
    fn with_attrs_on_empty_input_still_builds_new_handler() {
        let original: SharedDestination = Arc::new(FanOut::new(&shared(&[Mock::new(Level::Info)])));
        let derived = Arc::clone(&original).with_attrs(&[]);
        assert!(!Arc::ptr_eq(&original, &derived));
    }

    #[test]
    fn with_group_delegates_even_for_empty_name() {
        let mock = Mock::new(Level::Debug);
        let original: SharedDestination = Arc::new(FanOut::new(&shared(&[Arc::clone(&mock)])));

        let same_members = Arc::clone(&original).with_group("");
        assert!(!Arc::ptr_eq(&original, &same_members));
        same_members.emit(&Record::new(Level::Info, "plain")).unwrap();
        assert!(mock.last().context.is_empty());

        let grouped = Arc::clone(&original).with_group("req");
        grouped.emit(&Record::new(Level::Info, "grouped")).unwrap();
        assert_eq!(mock.last().context, vec![Attr::group("req", Vec::new())]);

        original.emit(&Record::new(Level::Info, "after")).unwrap();
        assert!(mock.last().context.is_empty());
    }

    #[test]
    fn zero_destinations_is_inert() {
        let fanout = FanOut::new(&[]);
        assert!(fanout.is_empty());
        for level in [Level::Debug, Level::Info, Level::Warn, Level::Error] {
            assert!(!fanout.enabled(level));
        }
        assert!(fanout.emit(&Record::new(Level::Error, "nobody")).is_ok());
    }

    #[test]
    fn construction_copies_the_list() {
        let kept = Mock::new(Level::Debug);
        let mut list = shared(&[Arc::clone(&kept)]);
        let fanout = FanOut::new(&list);

        let intruder = Mock::new(Level::Debug);
        list[0] = Arc::clone(&intruder) as SharedDestination;
        list.push(Arc::clone(&intruder) as SharedDestination);

        fanout.emit(&Record::new(Level::Info, "x")).unwrap();
        assert_eq!(fanout.len(), 1);
        assert_eq!(kept.count(), 1);
        assert_eq!(intruder.count(), 0);
    }

    #[test]
    fn concurrent_use_from_many_threads() {
        let mocks = [Mock::new(Level::Debug), Mock::new(Level::Warn)];
        let fanout: SharedDestination = Arc::new(FanOut::new(&shared(&mocks)));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let fanout = Arc::clone(&fanout);
                std::thread::spawn(move || {
                    let derived = Arc::clone(&fanout).with_group(&format!("t{i}"));
                    for _ in 0..25 {
                        derived.emit(&Record::new(Level::Info, "tick")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(mocks[0].count(), 200);
        assert_eq!(mocks[1].count(), 0);
    }
}
