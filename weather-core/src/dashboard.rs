//! Explicit dashboard state and the lookups that drive it.
//!
//! Every lookup takes a [`Ticket`] before any network traffic starts. When it
//! completes, its result is only applied if no newer lookup has been issued in
//! the meantime, so a slow earlier request can never overwrite a later one.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Result, WeatherError},
    geolocation::Geolocator,
    model::{
        AirQualityReading, CurrentConditions, ForecastEntry, HourlyEntry, Query, Units,
        WeatherReport,
    },
    provider::WeatherProvider,
    recent::RecentCities,
};

/// Generation number handed out when a lookup starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticket(u64);

/// What happened to a finished lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Completion {
    Applied,
    /// A newer lookup was issued before this one finished.
    Stale,
    /// Nothing was requested (blank input).
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    city: String,
    units: Units,
    current: Option<CurrentConditions>,
    daily: Vec<ForecastEntry>,
    hourly: Vec<HourlyEntry>,
    air_quality: Option<AirQualityReading>,
    utc_offset: i32,
    error: Option<String>,
    loading: bool,
    recent: RecentCities,
    latest_request: u64,
    /// Units the latest lookup was issued with.
    requested_units: Units,
    /// Units the shown results were fetched in.
    shown_units: Units,
}

impl DashboardState {
    pub fn new(units: Units) -> Self {
        Self {
            units,
            requested_units: units,
            shown_units: units,
            ..Self::default()
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Units of the results on display, which may differ from [`units`](Self::units)
    /// after a change that has not been searched with yet.
    pub fn shown_units(&self) -> Units {
        self.shown_units
    }

    pub fn current(&self) -> Option<&CurrentConditions> {
        self.current.as_ref()
    }

    pub fn daily(&self) -> &[ForecastEntry] {
        &self.daily
    }

    pub fn hourly(&self) -> &[HourlyEntry] {
        &self.hourly
    }

    pub fn air_quality(&self) -> Option<AirQualityReading> {
        self.air_quality
    }

    pub fn utc_offset(&self) -> i32 {
        self.utc_offset
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn recent(&self) -> &RecentCities {
        &self.recent
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Error
        } else if self.current.is_some() {
            Phase::Success
        } else {
            Phase::Idle
        }
    }

    /// Text in the search box.
    pub fn set_city(&mut self, city: &str) {
        self.city = city.to_string();
    }

    /// Applies to the next lookup; shown results keep the units they were fetched in.
    pub fn set_units(&mut self, units: Units) {
        self.units = units;
    }

    pub fn begin(&mut self) -> Ticket {
        self.latest_request += 1;
        self.requested_units = self.units;
        self.loading = true;
        Ticket(self.latest_request)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest_request
    }

    /// Completes a by-name search. Success also records `query` in the recent list.
    pub fn finish_search(
        &mut self,
        ticket: Ticket,
        query: &str,
        result: Result<WeatherReport>,
    ) -> Completion {
        if !self.accept(ticket) {
            return Completion::Stale;
        }

        match result {
            Ok(report) => {
                self.apply_report(report);
                self.recent.record(query);
            }
            Err(err) => {
                self.clear_results();
                self.error = Some(err.to_string());
            }
        }
        Completion::Applied
    }

    /// Completes a lookup by device location. Failures leave shown results alone.
    pub fn finish_locate(&mut self, ticket: Ticket, result: Result<WeatherReport>) -> Completion {
        if !self.accept(ticket) {
            return Completion::Stale;
        }

        match result {
            Ok(report) => self.apply_report(report),
            Err(err) => self.error = Some(err.to_string()),
        }
        Completion::Applied
    }

    /// Completes a single current-conditions lookup; forecast panels are emptied.
    pub fn finish_quick(
        &mut self,
        ticket: Ticket,
        result: Result<CurrentConditions>,
    ) -> Completion {
        if !self.accept(ticket) {
            return Completion::Stale;
        }

        self.clear_results();
        match result {
            Ok(current) => {
                self.city = current.name.clone();
                self.current = Some(current);
                self.shown_units = self.requested_units;
                self.error = None;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
        Completion::Applied
    }

    fn accept(&mut self, ticket: Ticket) -> bool {
        if !self.is_latest(ticket) {
            debug!(?ticket, latest = self.latest_request, "Discarding stale weather response");
            return false;
        }
        self.loading = false;
        true
    }

    fn apply_report(&mut self, report: WeatherReport) {
        info!(city = %report.current.name, "Weather updated");

        self.city = report.current.name.clone();
        self.current = Some(report.current);
        self.daily = report.daily;
        self.hourly = report.hourly;
        self.air_quality = report.air_quality;
        self.utc_offset = report.utc_offset;
        self.shown_units = self.requested_units;
        self.error = None;
    }

    fn clear_results(&mut self) {
        self.current = None;
        self.daily.clear();
        self.hourly.clear();
        self.air_quality = None;
        self.utc_offset = 0;
    }
}

/// Owns the state and runs lookups against a provider.
///
/// Lookups take `&self`, so several may be in flight at once; the state lock is
/// never held across a request.
#[derive(Debug)]
pub struct Dashboard {
    provider: Box<dyn WeatherProvider>,
    geolocator: Option<Box<dyn Geolocator>>,
    state: Mutex<DashboardState>,
}

impl Dashboard {
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        geolocator: Option<Box<dyn Geolocator>>,
        units: Units,
    ) -> Self {
        Self {
            provider,
            geolocator,
            state: Mutex::new(DashboardState::new(units)),
        }
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.lock().clone()
    }

    pub fn set_units(&self, units: Units) {
        self.state.lock().set_units(units);
    }

    /// Search with the query's units, which also become the session default.
    pub async fn submit(&self, query: &Query) -> Completion {
        self.set_units(query.units);
        self.search(&query.city).await
    }

    /// Geocode `city`, fetch its full report and apply it.
    pub async fn search(&self, city: &str) -> Completion {
        let city = city.trim();
        if city.is_empty() {
            return Completion::Ignored;
        }

        let (ticket, units) = {
            let mut state = self.state.lock();
            state.set_city(city);
            (state.begin(), state.units())
        };
        debug!(?ticket, city, %units, "Search started");

        let result = async {
            let location = self.provider.geocode(city).await?;
            self.provider.report(&location, units).await
        }
        .await;

        self.state.lock().finish_search(ticket, city, result)
    }

    /// Fetch the report for the device location, skipping geocoding.
    pub async fn locate(&self) -> Completion {
        let (ticket, units) = {
            let mut state = self.state.lock();
            (state.begin(), state.units())
        };
        debug!(?ticket, %units, "Location lookup started");

        let result = async {
            let geolocator = self.geolocator.as_ref().ok_or(WeatherError::Unavailable)?;
            let location = geolocator.locate().await?;
            self.provider.report(&location, units).await
        }
        .await;

        self.state.lock().finish_locate(ticket, result)
    }

    /// Current conditions only, looked up by name in a single request.
    pub async fn quick(&self, city: &str) -> Completion {
        let city = city.trim();
        if city.is_empty() {
            return Completion::Ignored;
        }

        let (ticket, units) = {
            let mut state = self.state.lock();
            state.set_city(city);
            (state.begin(), state.units())
        };

        let result = self.provider.current_by_name(city, units).await;
        self.state.lock().finish_quick(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geolocation::Geolocator,
        model::Location,
        provider::openweather::OpenWeatherProvider,
        view::{ViewMode, render},
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::{collections::HashMap, time::Duration};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn conditions(name: &str, temperature: f64) -> CurrentConditions {
        CurrentConditions {
            name: name.to_string(),
            country: None,
            temperature,
            description: "clear sky".to_string(),
            icon: "01d".to_string(),
            humidity: None,
            wind_speed: None,
        }
    }

    fn report(name: &str, temperature: f64) -> WeatherReport {
        WeatherReport {
            current: conditions(name, temperature),
            daily: Vec::new(),
            hourly: vec![HourlyEntry {
                time: "12:00".into(),
                temperature: 10,
                icon: "01d".into(),
            }],
            air_quality: Some(AirQualityReading::from_index(2)),
            utc_offset: 0,
        }
    }

    /// Cities it knows resolve to their canonical name; reports can be delayed per city.
    #[derive(Debug, Default)]
    struct FakeProvider {
        known: HashMap<String, &'static str>,
        delays: HashMap<&'static str, Duration>,
        fail_report: bool,
    }

    impl FakeProvider {
        fn with_cities(cities: &[&'static str]) -> Self {
            Self {
                known: cities.iter().map(|c| (c.to_lowercase(), *c)).collect(),
                ..Self::default()
            }
        }

        fn name_of(&self, city: &str) -> Result<&'static str> {
            let name = self.known.get(&city.to_lowercase());
            name.copied().ok_or(WeatherError::NotFound)
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn geocode(&self, city: &str) -> Result<Location> {
            let name = self.name_of(city)?;
            Ok(Location {
                latitude: 1.0,
                longitude: 2.0,
                name: Some(name.to_string()),
            })
        }

        async fn current_by_name(&self, city: &str, _units: Units) -> Result<CurrentConditions> {
            let name = self.name_of(city)?;
            Ok(conditions(name, 5.0))
        }

        async fn report(&self, location: &Location, _units: Units) -> Result<WeatherReport> {
            let name = location.name.as_deref().unwrap_or("Here");
            if let Some(delay) = self.delays.get(name) {
                tokio::time::sleep(*delay).await;
            }
            if self.fail_report {
                return Err(WeatherError::FetchFailed);
            }
            Ok(report(name, 20.0))
        }
    }

    #[derive(Debug)]
    struct FixedGeolocator(Option<Location>);

    #[async_trait]
    impl Geolocator for FixedGeolocator {
        async fn locate(&self) -> Result<Location> {
            self.0.clone().ok_or(WeatherError::Unavailable)
        }
    }

    fn dashboard(provider: FakeProvider) -> Dashboard {
        Dashboard::new(Box::new(provider), None, Units::Metric)
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut state = DashboardState::new(Units::Metric);

        let london = state.begin();
        let tokyo = state.begin();

        let tokyo_done = state.finish_search(tokyo, "Tokyo", Ok(report("Tokyo", 20.0)));
        let london_done = state.finish_search(london, "London", Ok(report("London", 9.0)));
        assert_eq!(tokyo_done, Completion::Applied);
        assert_eq!(london_done, Completion::Stale);

        assert_eq!(state.city(), "Tokyo");
        assert_eq!(state.recent().as_slice(), ["Tokyo"]);
        assert!(!state.is_loading());
    }

    #[test]
    fn stale_completion_does_not_clear_loading() {
        let mut state = DashboardState::new(Units::Metric);

        let first = state.begin();
        let _second = state.begin();

        let _ = state.finish_search(first, "Paris", Err(WeatherError::FetchFailed));
        assert!(state.is_loading());
        assert_eq!(state.phase(), Phase::Loading);
        assert_eq!(state.error(), None);
    }

    #[test]
    fn phases() {
        let mut state = DashboardState::new(Units::Metric);
        assert_eq!(state.phase(), Phase::Idle);

        let t = state.begin();
        assert_eq!(state.phase(), Phase::Loading);
        let _ = state.finish_search(t, "Paris", Ok(report("Paris", 15.0)));
        assert_eq!(state.phase(), Phase::Success);

        let t = state.begin();
        let _ = state.finish_search(t, "Nowhere", Err(WeatherError::NotFound));
        assert_eq!(state.phase(), Phase::Error);
    }

    #[test]
    fn state_serializes() {
        let mut state = DashboardState::new(Units::Imperial);
        let t = state.begin();
        let _ = state.finish_search(t, "Paris", Ok(report("Paris", 59.0)));

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["units"], "imperial");
        assert_eq!(value["city"], "Paris");

        let back: DashboardState = serde_json::from_value(value).unwrap();
        assert_eq!(back, state);
    }

    #[tokio::test]
    async fn search_success_updates_city_and_recent() {
        let dash = dashboard(FakeProvider::with_cities(&["New York"]));

        assert_eq!(dash.search("  new york ").await, Completion::Applied);

        let state = dash.snapshot();
        assert_eq!(state.city(), "New York");
        assert_eq!(state.recent().as_slice(), ["new york"]);
        assert_eq!(state.error(), None);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn not_found_clears_results_and_keeps_recent() {
        let dash = dashboard(FakeProvider::with_cities(&["Paris"]));

        let _ = dash.search("Paris").await;
        let _ = dash.search("Atlantis").await;

        let state = dash.snapshot();
        assert_eq!(state.error(), Some("City not found"));
        assert!(state.current().is_none());
        assert!(state.hourly().is_empty());
        assert_eq!(state.air_quality(), None);
        assert_eq!(state.recent().as_slice(), ["Paris"]);
    }

    #[tokio::test]
    async fn fetch_failure_is_generic_and_not_recorded() {
        let provider = FakeProvider {
            fail_report: true,
            ..FakeProvider::with_cities(&["Paris"])
        };
        let dash = dashboard(provider);

        let _ = dash.search("Paris").await;

        let state = dash.snapshot();
        assert_eq!(state.error(), Some("Failed to fetch weather data"));
        assert!(state.recent().is_empty());
    }

    #[tokio::test]
    async fn success_clears_previous_error() {
        let dash = dashboard(FakeProvider::with_cities(&["Paris"]));

        let _ = dash.search("Atlantis").await;
        assert!(dash.snapshot().error().is_some());

        let _ = dash.search("paris").await;
        assert_eq!(dash.snapshot().error(), None);
    }

    #[tokio::test]
    async fn submit_switches_units() {
        let dash = dashboard(FakeProvider::with_cities(&["Paris"]));

        let query = Query::new("Paris", Units::Imperial);
        assert_eq!(dash.submit(&query).await, Completion::Applied);
        assert_eq!(dash.snapshot().units(), Units::Imperial);
    }

    #[test]
    fn units_change_keeps_fetched_units_on_display() {
        let mut state = DashboardState::new(Units::Metric);

        let t = state.begin();
        state.set_units(Units::Imperial);
        let _ = state.finish_search(t, "Paris", Ok(report("Paris", 15.0)));
        assert_eq!(state.units(), Units::Imperial);
        assert_eq!(state.shown_units(), Units::Metric);

        let t = state.begin();
        let _ = state.finish_search(t, "Paris", Ok(report("Paris", 59.0)));
        assert_eq!(state.shown_units(), Units::Imperial);
    }

    #[tokio::test]
    async fn blank_search_is_ignored() {
        let dash = dashboard(FakeProvider::default());

        assert_eq!(dash.search("   ").await, Completion::Ignored);
        assert_eq!(dash.snapshot().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn recent_list_stays_bounded_and_unique() {
        let cities = ["Paris", "Rome", "Oslo", "Lima", "Cairo", "Tokyo"];
        let dash = dashboard(FakeProvider::with_cities(&cities));

        for city in cities {
            let _ = dash.search(city).await;
        }
        let _ = dash.search("ROME").await;

        let state = dash.snapshot();
        assert_eq!(
            state.recent().as_slice(),
            ["ROME", "Tokyo", "Cairo", "Lima", "Oslo"]
        );
    }

    #[tokio::test]
    async fn last_initiated_search_wins_over_slow_earlier_one() {
        let mut provider = FakeProvider::with_cities(&["London", "Tokyo"]);
        provider.delays.insert("London", Duration::from_millis(150));
        let dash = dashboard(provider);

        let (london, tokyo) = tokio::join!(dash.search("London"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            dash.search("Tokyo").await
        });

        assert_eq!(tokyo, Completion::Applied);
        assert_eq!(london, Completion::Stale);

        let state = dash.snapshot();
        assert_eq!(state.city(), "Tokyo");
        assert_eq!(state.current().map(|c| c.name.as_str()), Some("Tokyo"));
        assert_eq!(state.recent().as_slice(), ["Tokyo"]);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn locate_bypasses_geocoding_and_recent() {
        let geolocator = FixedGeolocator(Some(Location {
            latitude: 52.5,
            longitude: 13.4,
            name: Some("Berlin".into()),
        }));
        let dash = Dashboard::new(
            Box::new(FakeProvider::default()),
            Some(Box::new(geolocator)),
            Units::Metric,
        );

        assert_eq!(dash.locate().await, Completion::Applied);

        let state = dash.snapshot();
        assert_eq!(state.city(), "Berlin");
        assert!(state.recent().is_empty());
    }

    #[tokio::test]
    async fn locate_failure_does_not_block_search() {
        let dash = Dashboard::new(
            Box::new(FakeProvider::with_cities(&["Paris"])),
            Some(Box::new(FixedGeolocator(None))),
            Units::Metric,
        );

        let _ = dash.locate().await;
        let state = dash.snapshot();
        assert_eq!(state.error(), Some("Could not retrieve location"));
        assert!(!state.is_loading());

        assert_eq!(dash.search("Paris").await, Completion::Applied);
        assert_eq!(dash.snapshot().error(), None);
    }

    #[tokio::test]
    async fn locate_without_geolocator_is_unavailable() {
        let dash = dashboard(FakeProvider::default());

        let _ = dash.locate().await;
        assert_eq!(dash.snapshot().error(), Some("Could not retrieve location"));
    }

    #[tokio::test]
    async fn quick_lookup_sets_current_only() {
        let dash = dashboard(FakeProvider::with_cities(&["Paris"]));

        let _ = dash.search("Paris").await;
        let _ = dash.quick("paris").await;

        let state = dash.snapshot();
        assert_eq!(state.current().map(|c| c.temperature), Some(5.0));
        assert!(state.hourly().is_empty());
        assert_eq!(state.air_quality(), None);
    }

    #[tokio::test]
    async fn quick_lookup_unknown_city() {
        let dash = dashboard(FakeProvider::default());

        let _ = dash.quick("Nowhere").await;
        assert_eq!(dash.snapshot().error(), Some("City not found"));
    }

    #[tokio::test]
    async fn paris_end_to_end_against_mock_api() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "Paris"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "lat": 48.85, "lon": 2.35 }])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "48.85"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Paris",
                "main": { "temp": 15.2 },
                "weather": [{ "description": "clear sky", "icon": "01d" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "list": [] })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/air_pollution"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [{ "main": { "aqi": 1 } }]
            })))
            .mount(&server)
            .await;

        let provider =
            OpenWeatherProvider::with_base_url("k".into(), &server.uri(), Duration::from_secs(5))
                .unwrap();
        let dash = Dashboard::new(Box::new(provider), None, Units::Metric);

        assert_eq!(dash.search("Paris").await, Completion::Applied);

        let state = dash.snapshot();
        assert_eq!(state.recent().as_slice(), ["Paris"]);

        let out = render(&state, ViewMode::Full);
        assert!(out.contains("15°"), "{out}");
        assert!(out.contains("clear sky"), "{out}");
    }
}
