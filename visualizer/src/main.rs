use iced::{
    mouse, time,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, scrollable, text, text_input, Column, Container, Row,
    },
    Alignment, Color, Element, Length, Point, Rectangle, Renderer, Size, Subscription, Task,
    Theme,
};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use wifimapcore::analysis::{ApModel, WallMaterial};
use wifimapcore::math::GridStats;
use wifimapcore::model::{
    Band, FloorPlan, Language, NetworkObservation, ProjectSettings, TextDirection, ThemeChoice,
};
use wifimapcore::telemetry::MetricsSnapshot;

const BRIDGE_URL: &str = "http://127.0.0.1:9000";

fn main() -> iced::Result {
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "WiFi Survey Visualizer".into()
}

fn application_subscription(_: &Visualizer) -> Subscription<Message> {
    time::every(Duration::from_secs(1)).map(|_| Message::Tick)
}

fn application_theme(state: &Visualizer) -> Theme {
    if state.settings().theme.is_dark() {
        Theme::Dark
    } else {
        Theme::Light
    }
}

#[derive(Debug)]
struct Visualizer {
    form: ActionForm,
    payload: Option<SurveyPayload>,
    status: String,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    PayloadFetched(Result<SurveyPayload, String>),
    FieldChanged(FormField, String),
    Run(Action),
    SelectApModel(ApModel),
    SelectWall(WallMaterial),
    SelectTheme(ThemeChoice),
    SelectLanguage(Language),
    Toggle(SettingToggle),
    Finished(&'static str, Result<String, String>),
}

#[derive(Debug, Clone, Copy)]
enum FormField {
    FloorPlan,
    Resolution,
    Seed,
    Devices,
}

#[derive(Debug, Clone, Copy)]
enum SettingToggle {
    Offline,
    Wifi6,
    Wpa3,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    FloorPlan,
    Scan,
    Heatmap,
    DeadZones,
    Optimize,
    Interference,
    Simulate,
}

impl Action {
    fn endpoint(&self) -> &'static str {
        match self {
            Action::FloorPlan => "floor-plan",
            Action::Scan => "scan",
            Action::Heatmap => "heatmap",
            Action::DeadZones => "dead-zones",
            Action::Optimize => "optimize",
            Action::Interference => "interference",
            Action::Simulate => "simulate",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Action::FloorPlan => "Load Floor Plan",
            Action::Scan => "Scan Networks",
            Action::Heatmap => "Generate Heatmap",
            Action::DeadZones => "Detect Dead Zones",
            Action::Optimize => "Optimize Channels",
            Action::Interference => "Check Interference",
            Action::Simulate => "Run Simulation",
        }
    }
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        (
            Visualizer {
                form: ActionForm::default(),
                payload: None,
                status: "Waiting for the survey bridge...".into(),
                history: Vec::new(),
            },
            Task::perform(fetch_payload(), Message::PayloadFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => Task::perform(fetch_payload(), Message::PayloadFetched),
            Message::PayloadFetched(Ok(payload)) => {
                if state.payload.as_ref().map(|p| &p.status) != Some(&payload.status) {
                    state.push_history(payload.status.clone());
                }
                state.status = format!(
                    "{} networks on {}, scan {}%",
                    payload.observations.len(),
                    payload.band,
                    payload.scan_progress
                );
                state.payload = Some(payload);
                Task::none()
            }
            Message::PayloadFetched(Err(err)) => {
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
            Message::FieldChanged(field, value) => {
                state.form.update_field(field, value);
                Task::none()
            }
            Message::Run(action) => {
                let body = state.form.body_for(action);
                state.status = format!("{}...", action.label());
                Task::perform(post_action(action.endpoint(), body), move |result| {
                    Message::Finished(action.label(), result)
                })
            }
            Message::SelectApModel(model) => {
                state.form.ap_model = model;
                Task::none()
            }
            Message::SelectWall(wall) => {
                state.form.wall = wall;
                Task::none()
            }
            Message::SelectTheme(theme) => post_settings(json!({ "theme": theme })),
            Message::SelectLanguage(language) => {
                post_settings(json!({ "language": language }))
            }
            Message::Toggle(toggle) => {
                let settings = state.settings();
                let body = match toggle {
                    SettingToggle::Offline => json!({ "offline": !settings.offline }),
                    SettingToggle::Wifi6 => json!({ "wifi6": !settings.wifi6 }),
                    SettingToggle::Wpa3 => json!({ "wpa3": !settings.wpa3 }),
                };
                post_settings(body)
            }
            Message::Finished(label, Ok(message)) => {
                state.status = format!("{label}: done");
                state.push_history(message);
                Task::perform(fetch_payload(), Message::PayloadFetched)
            }
            Message::Finished(label, Err(err)) => {
                state.status = format!("{label} failed: {err}");
                state.push_history(format!("{label} failed: {err}"));
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let settings = state.settings();
        let accent = {
            let rgb = settings.theme.palette().accent;
            Color::from_rgb8(rgb.0, rgb.1, rgb.2)
        };

        let actions = [
            Action::FloorPlan,
            Action::Scan,
            Action::Heatmap,
            Action::DeadZones,
            Action::Optimize,
            Action::Interference,
        ]
        .into_iter()
        .fold(Column::new().spacing(6), |col, action| {
            col.push(
                button(text(action.label()))
                    .on_press(Message::Run(action))
                    .width(Length::Fill)
                    .padding(8),
            )
        });

        let ap_models = ApModel::ALL.into_iter().fold(Column::new().spacing(4), |col, model| {
            col.push(choice_button(
                model.label(),
                model == state.form.ap_model,
                Message::SelectApModel(model),
            ))
        });
        let walls = WallMaterial::ALL.into_iter().fold(Row::new().spacing(4), |row, wall| {
            row.push(choice_button(
                &wall.to_string(),
                wall == state.form.wall,
                Message::SelectWall(wall),
            ))
        });
        let themes = ThemeChoice::ALL.into_iter().fold(Row::new().spacing(4), |row, theme| {
            row.push(choice_button(
                theme.label(),
                theme == settings.theme,
                Message::SelectTheme(theme),
            ))
        });
        let languages = Language::ALL.into_iter().fold(Row::new().spacing(4), |row, language| {
            row.push(choice_button(
                language.label(),
                language == settings.language,
                Message::SelectLanguage(language),
            ))
        });
        let toggles = row![
            toggle_button("Offline", settings.offline, SettingToggle::Offline),
            toggle_button("WiFi 6", settings.wifi6, SettingToggle::Wifi6),
            toggle_button("WPA3", settings.wpa3, SettingToggle::Wpa3),
        ]
        .spacing(4);

        let controls = column![
            text("Survey").size(26).color(accent),
            text_input("Floor plan image path", &state.form.floor_plan)
                .on_input(|value| Message::FieldChanged(FormField::FloorPlan, value))
                .padding(6),
            actions,
            text_input("Resolution (10-100 px)", &state.form.resolution)
                .on_input(|value| Message::FieldChanged(FormField::Resolution, value))
                .padding(6),
            text_input("Seed (optional)", &state.form.seed)
                .on_input(|value| Message::FieldChanged(FormField::Seed, value))
                .padding(6),
            text("Simulation").size(18),
            ap_models,
            walls,
            text_input("Devices (1-200)", &state.form.devices)
                .on_input(|value| Message::FieldChanged(FormField::Devices, value))
                .padding(6),
            button(text(Action::Simulate.label()))
                .on_press(Message::Run(Action::Simulate))
                .width(Length::Fill)
                .padding(8),
            text("Settings").size(18),
            themes,
            languages,
            toggles,
            text(&state.status).size(14),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(380.0));

        let (observations, heatmap, dead_zones, stats) = match &state.payload {
            Some(payload) => (
                payload.observations.as_slice(),
                payload.heatmap.clone(),
                payload.dead_zones.clone(),
                payload.stats,
            ),
            None => (&[][..], Vec::new(), Vec::new(), None),
        };

        let header = format!(
            "{:<20} {:<17} {:>3} {:>5} {:<10} {:>10} {:>4}",
            "SSID", "BSSID", "CH", "RSSI", "Security", "Frequency", "SNR"
        );
        let table = observations.iter().fold(
            Column::new().spacing(2).push(text(header).size(12)),
            |col, obs| {
                col.push(
                    text(format!(
                        "{:<20} {:<17} {:>3} {:>5} {:<10} {:>10} {:>4}",
                        obs.ssid,
                        obs.bssid,
                        obs.channel,
                        obs.rssi,
                        obs.security,
                        obs.frequency.to_string(),
                        obs.snr
                    ))
                    .size(12),
                )
            },
        );

        let stats_line = match stats {
            Some(stats) => text(format!(
                "Average RSSI: {:.1} dBm | Min: {:.1} dBm | Max: {:.1} dBm | Dead zones: {}",
                stats.mean,
                stats.min,
                stats.max,
                dead_zones.len()
            )),
            None => text("No heatmap yet"),
        }
        .size(14);

        let floor_plan = match state.payload.as_ref().and_then(|p| p.floor_plan.as_ref()) {
            Some(plan) => format!(
                "Floor plan: {} ({}x{})",
                plan.path.display(),
                plan.width,
                plan.height
            ),
            None => "Floor plan: none loaded".into(),
        };

        let heatmap_canvas = Canvas::new(Heatmap {
            cells: heatmap,
            dead_zones,
        })
        .width(Length::Fill)
        .height(Length::Fixed(320.0));

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let metrics = state
            .payload
            .as_ref()
            .map(|p| p.metrics)
            .unwrap_or_default();

        let survey_column = column![
            text("Networks").size(26).color(accent),
            Container::new(scrollable(table).height(Length::Fixed(200.0))).padding(6),
            text("Coverage").size(18),
            text(floor_plan).size(12),
            heatmap_canvas,
            stats_line,
            text(format!(
                "Scans: {} | Heatmaps: {} | Errors: {}",
                metrics.scans, metrics.heatmaps, metrics.errors
            ))
            .size(12),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(120.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let layout = match settings.language.direction() {
            TextDirection::LeftToRight => row![controls, survey_column],
            TextDirection::RightToLeft => row![survey_column, controls],
        }
        .spacing(20)
        .align_y(Alignment::Start)
        .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn settings(&self) -> ProjectSettings {
        self.payload
            .as_ref()
            .map(|payload| payload.settings.clone())
            .unwrap_or_default()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

fn choice_button<'a>(label: &str, selected: bool, message: Message) -> Element<'a, Message> {
    let label = if selected {
        format!("[{label}]")
    } else {
        label.to_string()
    };
    button(text(label).size(12))
        .on_press(message)
        .padding(4)
        .into()
}

fn toggle_button<'a>(label: &str, enabled: bool, toggle: SettingToggle) -> Element<'a, Message> {
    let state = if enabled { "on" } else { "off" };
    button(text(format!("{label}: {state}")).size(12))
        .on_press(Message::Toggle(toggle))
        .padding(4)
        .into()
}

fn post_settings(body: serde_json::Value) -> Task<Message> {
    Task::perform(post_action("settings", body), |result| {
        Message::Finished("Settings", result)
    })
}

async fn fetch_payload() -> Result<SurveyPayload, String> {
    let response = reqwest::get(format!("{BRIDGE_URL}/payload"))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<SurveyPayload>()
        .await
        .map_err(|e| e.to_string())
}

async fn post_action(endpoint: &'static str, body: serde_json::Value) -> Result<String, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{BRIDGE_URL}/{endpoint}"))
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = response.status();
    let reply = response
        .json::<ActionReply>()
        .await
        .map_err(|e| format!("{status}: {e}"))?;
    if status.is_success() {
        Ok(reply.message)
    } else {
        Err(reply.message)
    }
}

#[derive(Debug, Clone)]
struct ActionForm {
    floor_plan: String,
    resolution: String,
    seed: String,
    devices: String,
    ap_model: ApModel,
    wall: WallMaterial,
}

impl Default for ActionForm {
    fn default() -> Self {
        Self {
            floor_plan: String::new(),
            resolution: "50".into(),
            seed: String::new(),
            devices: "10".into(),
            ap_model: ApModel::default(),
            wall: WallMaterial::default(),
        }
    }
}

impl ActionForm {
    fn update_field(&mut self, field: FormField, value: String) {
        match field {
            FormField::FloorPlan => self.floor_plan = value,
            FormField::Resolution => self.resolution = value,
            FormField::Seed => self.seed = value,
            FormField::Devices => self.devices = value,
        }
    }

    /// Unparseable fields go out as null so the bridge falls back to its defaults.
    fn body_for(&self, action: Action) -> serde_json::Value {
        match action {
            Action::FloorPlan => json!({ "path": self.floor_plan.trim() }),
            Action::Heatmap => json!({
                "resolution": self.resolution.trim().parse::<u32>().ok(),
                "seed": self.seed.trim().parse::<u64>().ok(),
            }),
            Action::Simulate => json!({
                "ap_model": self.ap_model,
                "wall_material": self.wall,
                "device_count": self.devices.trim().parse::<u32>().unwrap_or(10),
            }),
            _ => json!({}),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActionReply {
    message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SurveyPayload {
    observations: Vec<NetworkObservation>,
    heatmap: Vec<Vec<f64>>,
    dead_zones: Vec<(usize, usize)>,
    stats: Option<GridStats>,
    settings: ProjectSettings,
    floor_plan: Option<FloorPlan>,
    band: Band,
    scan_progress: u8,
    status: String,
    metrics: MetricsSnapshot,
}

/// Maps dBm over [-100, 0] onto a viridis-like ramp.
fn signal_color(dbm: f64) -> Color {
    const STOPS: [(f32, f32, f32); 5] = [
        (0.267, 0.005, 0.329),
        (0.231, 0.322, 0.545),
        (0.129, 0.569, 0.549),
        (0.369, 0.788, 0.384),
        (0.993, 0.906, 0.144),
    ];
    let t = ((dbm + 100.0) / 100.0).clamp(0.0, 1.0) as f32;
    let scaled = t * (STOPS.len() - 1) as f32;
    let index = (scaled.floor() as usize).min(STOPS.len() - 2);
    let frac = scaled - index as f32;
    let (r0, g0, b0) = STOPS[index];
    let (r1, g1, b1) = STOPS[index + 1];
    Color::from_rgb(
        r0 + (r1 - r0) * frac,
        g0 + (g1 - g0) * frac,
        b0 + (b1 - b0) * frac,
    )
}

#[derive(Clone)]
struct Heatmap {
    cells: Vec<Vec<f64>>,
    dead_zones: Vec<(usize, usize)>,
}

impl canvas::Program<Message> for Heatmap {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        let rows = self.cells.len();
        let cols = self.cells.first().map_or(0, Vec::len);
        if rows > 0 && cols > 0 {
            let cell = Size::new(bounds.width / cols as f32, bounds.height / rows as f32);
            for (r, values) in self.cells.iter().enumerate() {
                for (c, &value) in values.iter().enumerate() {
                    let origin = Point::new(c as f32 * cell.width, r as f32 * cell.height);
                    frame.fill_rectangle(origin, cell, signal_color(value));
                }
            }

            for &(r, c) in &self.dead_zones {
                let origin = Point::new(c as f32 * cell.width, r as f32 * cell.height);
                frame.stroke(
                    &Path::rectangle(origin, cell),
                    Stroke::default()
                        .with_width(1.0)
                        .with_color(Color::from_rgb(0.95, 0.3, 0.3)),
                );
            }
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_ramp_clamps_to_its_ends() {
        assert_eq!(signal_color(-150.0), signal_color(-100.0));
        assert_eq!(signal_color(20.0), signal_color(0.0));
        assert!(signal_color(-30.0).g > signal_color(-100.0).g);
    }

    #[test]
    fn heatmap_body_skips_unparseable_fields() {
        let mut form = ActionForm::default();
        form.update_field(FormField::Seed, "abc".into());
        let body = form.body_for(Action::Heatmap);
        assert_eq!(body["resolution"], 50);
        assert!(body["seed"].is_null());
    }

    #[test]
    fn payload_tolerates_missing_fields() {
        let payload: SurveyPayload = serde_json::from_str(r#"{"status": "Ready"}"#).unwrap();
        assert!(payload.heatmap.is_empty());
        assert_eq!(payload.settings, ProjectSettings::default());
    }
}
