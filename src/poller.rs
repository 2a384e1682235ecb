// The refresh loop: wait out the interval, fetch, draw both rows

use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};

use crate::{api::FlightSource, display::CharacterDisplay};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Second row of the display, padded to sit roughly centered on 16 columns.
pub fn format_time_line<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("    %H:%M:%S").to_string()
}

pub struct Poller<D, S, C> {
    display: D,
    source: S,
    clock: C,
    interval: TimeDelta,
    idle: Duration,
    last_update: DateTime<Utc>,
}

impl<D: CharacterDisplay, S: FlightSource, C: Clock> Poller<D, S, C> {
    pub fn new(display: D, source: S, clock: C, interval: Duration, idle: Duration) -> Self {
        Poller {
            display,
            source,
            clock,
            interval: TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX),
            idle,
            last_update: DateTime::<Utc>::default(), // unix epoch, first check always refreshes
        }
    }

    /// Refreshes if the interval has passed. Returns whether it did.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        if now.signed_duration_since(self.last_update) <= self.interval {
            return false;
        }

        // set before fetching so a slow or failing request doesn't cause rapid retries
        self.last_update = now;
        log::info!("requesting flight data");

        if let Err(e) = self.display.clear() {
            log::error!("failed to clear display: {e}");
        }

        let flight = self.source.get_next_flight();
        let time = format_time_line(&now.with_timezone(&Local));
        log::info!("showing {flight:?}");

        if let Err(e) = self.display.write(0, 0, &flight) {
            log::error!("failed to write flight line: {e}");
        }
        if let Err(e) = self.display.write(0, 1, &time) {
            log::error!("failed to write time line: {e}");
        }

        true
    }

    /// Loops until `stop` is set, then blanks the display.
    pub fn run(&mut self, stop: &AtomicBool) {
        while !stop.load(Ordering::SeqCst) {
            if !self.tick() {
                thread::sleep(self.idle);
            }
        }

        log::info!("shutting down, clearing display");
        if let Err(e) = self.display.clear() {
            log::error!("failed to clear display on shutdown: {e}");
        }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (D, S) {
        (self.display, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DisplayError;
    use std::{cell::Cell, rc::Rc, sync::Arc};

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Clear,
        Write(u8, u8, String),
    }

    #[derive(Default)]
    struct FakeDisplay {
        ops: Vec<Op>,
        broken: bool,
    }

    impl CharacterDisplay for FakeDisplay {
        fn clear(&mut self) -> Result<(), DisplayError> {
            self.ops.push(Op::Clear);
            Ok(())
        }

        fn write(&mut self, column: u8, row: u8, text: &str) -> Result<(), DisplayError> {
            if self.broken {
                return Err(DisplayError::Position { row });
            }
            self.ops.push(Op::Write(column, row, text.to_owned()));
            Ok(())
        }
    }

    struct FakeSource {
        calls: usize,
        stop_after: Option<(usize, Arc<AtomicBool>)>,
    }

    impl FakeSource {
        fn new() -> Self {
            FakeSource {
                calls: 0,
                stop_after: None,
            }
        }
    }

    impl FlightSource for FakeSource {
        fn get_next_flight(&mut self) -> String {
            self.calls += 1;
            if let Some((n, stop)) = &self.stop_after {
                if self.calls >= *n {
                    stop.store(true, Ordering::SeqCst);
                }
            }
            String::from("LH2471 LAND")
        }
    }

    #[derive(Clone)]
    struct FakeClock(Rc<Cell<i64>>);

    impl FakeClock {
        fn at(secs: i64) -> Self {
            FakeClock(Rc::new(Cell::new(secs)))
        }

        fn advance(&self, secs: i64) {
            self.0.set(self.0.get() + secs);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::from_timestamp(self.0.get(), 0).unwrap()
        }
    }

    const START: i64 = 1_700_000_000;

    fn poller(
        display: FakeDisplay,
        source: FakeSource,
        clock: FakeClock,
    ) -> Poller<FakeDisplay, FakeSource, FakeClock> {
        Poller::new(
            display,
            source,
            clock,
            Duration::from_secs(300),
            Duration::from_millis(1),
        )
    }

    #[test]
    fn first_tick_refreshes_clear_then_both_rows() {
        let clock = FakeClock::at(START);
        let mut poller = poller(FakeDisplay::default(), FakeSource::new(), clock);

        assert!(poller.tick());

        let (display, source) = poller.into_parts();
        assert_eq!(source.calls, 1);
        assert_eq!(display.ops.len(), 3);
        assert_eq!(display.ops[0], Op::Clear);
        assert_eq!(display.ops[1], Op::Write(0, 0, "LH2471 LAND".into()));
        assert!(matches!(&display.ops[2], Op::Write(0, 1, t) if t.starts_with("    ") && t.len() == 12));
    }

    #[test]
    fn at_most_one_fetch_per_interval() {
        let clock = FakeClock::at(START);
        let mut poller = poller(FakeDisplay::default(), FakeSource::new(), clock.clone());

        poller.tick();
        for _ in 0..10 {
            clock.advance(29);
            poller.tick();
        }
        // 290 seconds in, still within the window
        assert_eq!(poller.source.calls, 1);

        clock.advance(10);
        assert!(!poller.tick());
        assert_eq!(poller.source.calls, 1);

        clock.advance(1);
        assert!(poller.tick());
        assert_eq!(poller.source.calls, 2);
    }

    #[test]
    fn exactly_interval_is_not_enough() {
        let clock = FakeClock::at(START);
        let mut poller = poller(FakeDisplay::default(), FakeSource::new(), clock.clone());

        poller.tick();
        clock.advance(300);
        assert!(!poller.tick());
        clock.advance(1);
        assert!(poller.tick());
    }

    #[test]
    fn display_failures_do_not_stop_the_cycle() {
        let display = FakeDisplay {
            broken: true,
            ..Default::default()
        };
        let clock = FakeClock::at(START);
        let mut poller = poller(display, FakeSource::new(), clock.clone());

        assert!(poller.tick());
        clock.advance(301);
        assert!(poller.tick());
        assert_eq!(poller.source.calls, 2);
    }

    #[test]
    fn interrupt_clears_display_before_returning() {
        let stop = Arc::new(AtomicBool::new(false));
        let source = FakeSource {
            calls: 0,
            stop_after: Some((1, stop.clone())),
        };
        let mut poller = poller(FakeDisplay::default(), source, FakeClock::at(START));

        poller.run(&stop);

        let (display, source) = poller.into_parts();
        assert_eq!(source.calls, 1);
        assert_eq!(display.ops.last(), Some(&Op::Clear));
    }

    #[test]
    fn stop_before_start_only_clears() {
        let stop = AtomicBool::new(true);
        let mut poller = poller(FakeDisplay::default(), FakeSource::new(), FakeClock::at(START));

        poller.run(&stop);

        let (display, source) = poller.into_parts();
        assert_eq!(source.calls, 0);
        assert_eq!(display.ops, vec![Op::Clear]);
    }

    #[test]
    fn time_line_format() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 7, 3, 9).unwrap();
        assert_eq!(format_time_line(&at), "    07:03:09");
    }
}
