//! Daily aggregation of hourly forecasts.

use chrono::NaiveDate;
use serde::Serialize;

use forecast::NormalizedForecast;

/// Summary of one UTC calendar day.
///
/// Temperature statistics only consider hours with a valid temperature and
/// are absent when there are none.
#[derive(Debug, Clone, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub avg_humidity: f64,
    /// Sum of the hourly rates, mm.
    pub total_precipitation: f64,
    pub hours: Vec<NormalizedForecast>,
}

#[derive(Default)]
struct Accumulator {
    min: Option<f64>,
    max: Option<f64>,
    temperature_sum: f64,
    temperature_count: u32,
    humidity_sum: f64,
    precipitation: f64,
    hours: Vec<NormalizedForecast>,
}

impl Accumulator {
    fn add(&mut self, forecast: NormalizedForecast) {
        if forecast.has_valid_temperature() {
            let t = forecast.temperature.celsius;
            self.min = Some(self.min.map_or(t, |m| if t < m { t } else { m }));
            self.max = Some(self.max.map_or(t, |m| if t > m { t } else { m }));
            self.temperature_sum += t;
            self.temperature_count += 1;
        }
        self.humidity_sum += forecast.humidity;
        self.precipitation += forecast.precipitation;
        self.hours.push(forecast);
    }

    fn finish(self, date: NaiveDate) -> DailyAggregate {
        let avg_temperature = (self.temperature_count > 0)
            .then(|| self.temperature_sum / f64::from(self.temperature_count));
        let avg_humidity = if self.hours.is_empty() {
            0.0
        } else {
            self.humidity_sum / self.hours.len() as f64
        };

        DailyAggregate {
            date,
            min_temperature: self.min,
            max_temperature: self.max,
            avg_temperature,
            avg_humidity,
            total_precipitation: self.precipitation,
            hours: self.hours,
        }
    }
}

/// Group forecasts by UTC date, ascending. Hours keep their input order
/// within a day.
pub fn aggregate_daily(forecasts: Vec<NormalizedForecast>) -> Vec<DailyAggregate> {
    let mut days: Vec<(NaiveDate, Accumulator)> = Vec::new();

    for forecast in forecasts {
        let date = forecast.forecast_datetime.date_naive();
        match days.iter_mut().find(|(d, _)| *d == date) {
            Some((_, acc)) => acc.add(forecast),
            None => {
                let mut acc = Accumulator::default();
                acc.add(forecast);
                days.push((date, acc));
            }
        }
    }

    days.sort_by_key(|(date, _)| *date);
    days.into_iter()
        .map(|(date, acc)| acc.finish(date))
        .collect()
}
