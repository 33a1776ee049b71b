//! Date and time readout plus the one-second repaint ticker.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "en-GB")]
    EnGb,
}

impl Locale {
    fn month_name(self, month: u32) -> &'static str {
        const PT: [&str; 12] = [
            "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto",
            "setembro", "outubro", "novembro", "dezembro",
        ];
        const EN: [&str; 12] = [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December",
        ];
        let names = match self {
            Locale::PtBr => &PT,
            Locale::EnUs | Locale::EnGb => &EN,
        };
        names[(month as usize - 1) % 12]
    }
}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pt-BR" => Ok(Locale::PtBr),
            "en-US" => Ok(Locale::EnUs),
            "en-GB" => Ok(Locale::EnGb),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Locale::PtBr => "pt-BR",
            Locale::EnUs => "en-US",
            Locale::EnGb => "en-GB",
        })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown locale: {0} (expected pt-BR, en-US or en-GB)")]
pub struct UnknownLocale(String);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readout {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Clock {
    pub locale: Locale,
    pub utc_offset_minutes: i32,
}

impl Clock {
    pub fn readout(&self) -> Readout {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        self.readout_at(since_epoch.as_secs() as i64)
    }

    pub fn readout_at(&self, unix_secs: i64) -> Readout {
        let local = unix_secs + i64::from(self.utc_offset_minutes) * 60;
        let (year, month, day) = civil_from_days(local.div_euclid(86_400));
        let secs = local.rem_euclid(86_400);
        let (hour, minute, second) = (secs / 3600, secs / 60 % 60, secs % 60);
        let month_name = self.locale.month_name(month);

        match self.locale {
            Locale::PtBr => Readout {
                date: format!("{day:02} de {month_name} de {year}"),
                time: format!("{hour:02}:{minute:02}:{second:02}"),
            },
            Locale::EnGb => Readout {
                date: format!("{day:02} {month_name} {year}"),
                time: format!("{hour:02}:{minute:02}:{second:02}"),
            },
            Locale::EnUs => {
                let meridiem = if hour < 12 { "AM" } else { "PM" };
                let hour = match hour % 12 {
                    0 => 12,
                    h => h,
                };
                Readout {
                    date: format!("{month_name} {day:02}, {year}"),
                    time: format!("{hour}:{minute:02}:{second:02} {meridiem}"),
                }
            }
        }
    }
}

/// Proleptic Gregorian (year, month, day) for a count of days since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Sends `message` on a channel once per period until stopped or dropped.
#[derive(Debug)]
pub struct Ticker {
    stop: Option<flume::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start<T>(period: Duration, tx: flume::Sender<T>, message: T) -> Ticker
    where
        T: Clone + Send + 'static,
    {
        let (stop, stopped) = flume::bounded::<()>(0);
        let handle = std::thread::spawn(move || loop {
            match stopped.recv_timeout(period) {
                Err(flume::RecvTimeoutError::Timeout) => {
                    if tx.send(message.clone()).is_err() {
                        break;
                    }
                }
                // Stop requested or the owner went away
                _ => break,
            }
        });
        tracing::debug!(?period, "ticker started");
        Ticker {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        // Disconnecting wakes the thread immediately
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("ticker thread panicked");
            }
            tracing::debug!("ticker stopped");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
