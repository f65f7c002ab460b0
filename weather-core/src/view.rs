//! Text rendering of a [`DashboardState`].
//!
//! Both layouts read the same state. `Minimal` is the single-panel readout;
//! `Full` adds the forecast, hourly strip, air quality and recent searches.

use std::fmt;

use crate::{
    dashboard::DashboardState, forecast::utc_offset, icon::WeatherIcon, model::round_temperature,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    Minimal,
    #[default]
    Full,
}

pub const LOADING_LABEL: &str = "Loading...";
pub const EMPTY_HINT: &str = "Enter a city name to see the weather.";

pub struct DashboardView<'a> {
    state: &'a DashboardState,
    mode: ViewMode,
}

impl<'a> DashboardView<'a> {
    pub fn new(state: &'a DashboardState, mode: ViewMode) -> Self {
        Self { state, mode }
    }

    fn minimal(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;

        if state.is_loading() {
            return writeln!(f, "{LOADING_LABEL}");
        }
        if let Some(error) = state.error() {
            return writeln!(f, "{error}");
        }
        let Some(current) = state.current() else {
            return writeln!(f, "{EMPTY_HINT}");
        };

        let units = state.shown_units();
        writeln!(f, "Weather in {}", current.name)?;
        let symbol = units.temperature_symbol();
        writeln!(f, "Temperature: {} {symbol}", current.temperature)?;
        writeln!(f, "Weather: {}", current.description)?;
        if let Some(humidity) = current.humidity {
            writeln!(f, "Humidity: {humidity} %")?;
        }
        if let Some(speed) = current.wind_speed {
            writeln!(f, "Wind Speed: {speed} {}", units.wind_speed_unit())?;
        }
        Ok(())
    }

    fn full(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;

        if state.is_loading() {
            writeln!(f, "{LOADING_LABEL}")?;
        }
        if let Some(error) = state.error() {
            writeln!(f, "[!] {error}")?;
        }

        match state.current() {
            Some(current) => {
                match &current.country {
                    Some(country) => writeln!(f, "📍 {}, {}", current.name, country)?,
                    None => writeln!(f, "📍 {}", current.name)?,
                }
                writeln!(
                    f,
                    "{}  {}°  {}",
                    current.glyph().glyph(),
                    round_temperature(current.temperature),
                    current.description
                )?;

                let mut details = Vec::new();
                if let Some(humidity) = current.humidity {
                    details.push(format!("Humidity {humidity}%"));
                }
                if let Some(speed) = current.wind_speed {
                    let unit = state.shown_units().wind_speed_unit();
                    details.push(format!("Wind {speed} {unit}"));
                }
                if !details.is_empty() {
                    writeln!(f, "   {}", details.join(" · "))?;
                }
            }
            None if state.error().is_none() && !state.is_loading() => {
                writeln!(f, "{EMPTY_HINT}")?;
            }
            None => {}
        }

        if !state.daily().is_empty() {
            let offset = utc_offset(state.utc_offset());
            writeln!(f)?;
            writeln!(f, "5-Day Forecast")?;
            for day in state.daily() {
                writeln!(
                    f,
                    "  {}  {}  {}° / {}°",
                    day.timestamp.with_timezone(&offset).format("%a, %b %-d"),
                    WeatherIcon::from_code(&day.icon).glyph(),
                    round_temperature(day.temp_max),
                    round_temperature(day.temp_min),
                )?;
            }
        }

        if !state.hourly().is_empty() {
            writeln!(f)?;
            writeln!(f, "Next 24 Hours")?;
            let strip: Vec<String> = state
                .hourly()
                .iter()
                .map(|h| {
                    let glyph = WeatherIcon::from_code(&h.icon).glyph();
                    format!("{} {} {}°", h.time, glyph, h.temperature)
                })
                .collect();
            writeln!(f, "  {}", strip.join("  "))?;
        }

        if let Some(aq) = state.air_quality() {
            writeln!(f)?;
            writeln!(f, "Air Quality: {} ({})", aq.quality, aq.index)?;
        }

        if !state.recent().is_empty() {
            writeln!(f)?;
            let cities: Vec<&str> = state.recent().iter().collect();
            writeln!(f, "Recent: {}", cities.join(", "))?;
        }

        Ok(())
    }
}

impl fmt::Display for DashboardView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ViewMode::Minimal => self.minimal(f),
            ViewMode::Full => self.full(f),
        }
    }
}

pub fn render(state: &DashboardState, mode: ViewMode) -> String {
    DashboardView::new(state, mode).to_string()
}
