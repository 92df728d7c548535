use crate::gui_bridge::model::{ActionReply, FloorPlanRequest, SurveyModel};
use crate::workflow::runner::{HeatmapRequest, SettingsUpdate, Survey};
use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard},
    thread,
    time::Duration,
};
use tokio::runtime::Builder;
use warp::{
    http::StatusCode,
    reply::{Json, WithStatus},
    Filter, Rejection, Reply,
};
use wifimapcore::analysis::SimulationRequest;

pub type SharedSurvey = Arc<Mutex<Survey>>;

/// A panicking handler must not take the whole bridge down with it.
fn lock(survey: &SharedSurvey) -> MutexGuard<'_, Survey> {
    survey.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Survey session plus the last model published to readers.
///
/// Actions hold the survey mutex for as long as they run, including the scan
/// settle delay. `GET /payload` only takes the model's read lock, which is
/// written once per finished action.
#[derive(Clone)]
pub struct BridgeState {
    survey: SharedSurvey,
    model: Arc<RwLock<SurveyModel>>,
}

impl BridgeState {
    pub fn new(survey: SharedSurvey) -> Self {
        let model = lock(&survey).snapshot();
        Self {
            survey,
            model: Arc::new(RwLock::new(model)),
        }
    }

    fn publish(&self, survey: &Survey) {
        let snapshot = survey.snapshot();
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    fn model(&self) -> RwLockReadGuard<'_, SurveyModel> {
        self.model.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn respond(result: Result<ActionReply>) -> WithStatus<Json> {
    match result {
        Ok(reply) => warp::reply::with_status(warp::reply::json(&reply), StatusCode::OK),
        Err(err) => {
            warn!("bridge action failed: {:#}", err);
            warp::reply::with_status(
                warp::reply::json(&ActionReply::error(format!("{:#}", err))),
                StatusCode::UNPROCESSABLE_ENTITY,
            )
        }
    }
}

/// Runs a survey action off the reactor and publishes the resulting model.
async fn run_action<F>(state: BridgeState, action: F) -> Result<WithStatus<Json>, Rejection>
where
    F: FnOnce(&mut Survey) -> Result<ActionReply> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || {
        let mut survey = lock(&state.survey);
        let result = action(&mut survey);
        state.publish(&survey);
        result
    })
    .await
    .unwrap_or_else(|err| Err(anyhow!("survey action aborted: {}", err)));
    Ok(respond(result))
}

fn with_state(
    state: BridgeState,
) -> impl Filter<Extract = (BridgeState,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// The full localhost API: one read endpoint plus one POST per user action.
pub fn routes(
    state: BridgeState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let payload = warp::path("payload")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: BridgeState| warp::reply::json(&*state.model()));

    let scan = warp::path("scan")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(|state: BridgeState| {
            run_action(state, |survey| {
                let report = survey.scan()?;
                let detail = json!({
                    "networks": report.observations.len(),
                    "interfaces": report.interfaces,
                    "failures": report.failures,
                });
                Ok(ActionReply::ok(survey.status(), Some(detail)))
            })
        });

    let heatmap = warp::path("heatmap")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(|request: HeatmapRequest, state: BridgeState| {
            run_action(state, move |survey| {
                let (rows, cols) = survey.generate_heatmap(request)?.shape();
                let detail = json!({ "rows": rows, "cols": cols });
                Ok(ActionReply::ok(survey.status(), Some(detail)))
            })
        });

    let floor_plan = warp::path("floor-plan")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(|request: FloorPlanRequest, state: BridgeState| {
            run_action(state, move |survey| {
                survey.load_floor_plan(&request.path)?;
                let detail = serde_json::to_value(survey.floor_plan())?;
                Ok(ActionReply::ok(survey.status(), Some(detail)))
            })
        });

    let dead_zones = warp::path("dead-zones")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(|state: BridgeState| {
            run_action(state, |survey| {
                let count = survey.detect_dead_zones()?;
                Ok(ActionReply::ok(survey.status(), Some(json!({ "count": count }))))
            })
        });

    let optimize = warp::path("optimize")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(|state: BridgeState| {
            run_action(state, |survey| {
                let recommendation = survey.optimize_channels();
                let detail = serde_json::to_value(&recommendation)?;
                Ok(ActionReply::ok(survey.status(), Some(detail)))
            })
        });

    let interference = warp::path("interference")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state.clone()))
        .and_then(|state: BridgeState| {
            run_action(state, |survey| {
                let report = survey.check_interference();
                let detail = serde_json::to_value(&report)?;
                Ok(ActionReply::ok(report.to_string(), Some(detail)))
            })
        });

    let simulate = warp::path("simulate")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(|request: SimulationRequest, state: BridgeState| {
            run_action(state, move |survey| {
                let result = survey.simulate(request)?;
                let detail = serde_json::to_value(result)?;
                Ok(ActionReply::ok(result.to_string(), Some(detail)))
            })
        });

    let settings = warp::path("settings")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(|update: SettingsUpdate, state: BridgeState| {
            run_action(state, move |survey| {
                survey.update_settings(update);
                let detail = serde_json::to_value(survey.settings())?;
                Ok(ActionReply::ok(survey.status(), Some(detail)))
            })
        });

    payload
        .or(scan)
        .or(heatmap)
        .or(floor_plan)
        .or(dead_zones)
        .or(optimize)
        .or(interference)
        .or(simulate)
        .or(settings)
        .with(warp::log("surveyor::bridge"))
}

/// Rescans on a fixed period so the network table tracks the air.
async fn rescan_loop(state: BridgeState, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let state = state.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut survey = lock(&state.survey);
            if !survey.can_scan() {
                return Ok(None);
            }
            let result = survey.scan().map(|report| Some(report.observations.len()));
            state.publish(&survey);
            result
        })
        .await;
        match outcome {
            Ok(Ok(Some(count))) => debug!("periodic rescan found {} networks", count),
            Ok(Ok(None)) => {}
            Ok(Err(err)) => debug!("periodic rescan failed: {:#}", err),
            Err(err) => warn!("periodic rescan aborted: {}", err),
        }
    }
}

/// Bridge that hosts the survey HTTP endpoint for the visualizer.
pub struct GuiBridge {
    state: BridgeState,
}

impl GuiBridge {
    pub fn new(survey: SharedSurvey) -> Self {
        Self {
            state: BridgeState::new(survey),
        }
    }

    /// Binds `addr` and serves on a background thread alongside the rescan
    /// timer. Returns the bound address once the listener is up.
    pub fn serve(&self, addr: SocketAddr, rescan: Duration) -> Result<SocketAddr> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("creating bridge runtime")?;
        let state = self.state.clone();
        let (bound_tx, bound_rx) = mpsc::channel();

        thread::spawn(move || {
            runtime.block_on(async move {
                let server = warp::serve(routes(state.clone())).try_bind_ephemeral(addr);
                match server {
                    Ok((bound, server)) => {
                        let _ = bound_tx.send(Ok(bound));
                        tokio::join!(server, rescan_loop(state, rescan));
                    }
                    Err(err) => {
                        let _ = bound_tx.send(Err(err.to_string()));
                    }
                }
            });
        });

        let bound = bound_rx
            .recv()
            .context("bridge thread exited before binding")?
            .map_err(|err| anyhow!("failed to bind bridge on {}: {}", addr, err))?;
        info!("HTTP bridge listening on http://{}", bound);
        Ok(bound)
    }

    /// Called from the driver thread, never from the bridge runtime.
    pub fn publish_status(&self, message: &str) {
        let mut survey = lock(&self.state.survey);
        survey.set_status(message);
        self.state.publish(&survey);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> SurveyModel {
        self.state.model().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::SurveyConfig;
    use std::time::Instant;
    use wifimapcore::model::FloorPlan;
    use wifimapcore::scan::{FixtureSource, ScanProfile};

    fn shared_survey() -> SharedSurvey {
        survey_with_settle(0)
    }

    fn survey_with_settle(settle_ms: u64) -> SharedSurvey {
        let profiles = vec![
            ScanProfile {
                ssid: "office".into(),
                bssid: "10:00:00:00:00:01".into(),
                channel: Some(1),
                signal: -48,
                noise: Some(-90),
                freq_hz: 2_412_000_000,
                auth: Some("WPA2".into()),
            },
            ScanProfile {
                ssid: String::new(),
                bssid: "10:00:00:00:00:02".into(),
                channel: Some(11),
                signal: -71,
                noise: None,
                freq_hz: 2_462_000_000,
                auth: None,
            },
        ];
        let config = SurveyConfig {
            settle_ms,
            seed: Some(3),
            ..Default::default()
        };
        let source = FixtureSource::from_profiles(profiles);
        Arc::new(Mutex::new(Survey::new(config, Some(Box::new(source)))))
    }

    async fn post<F>(filter: &F, path: &str, body: serde_json::Value) -> (StatusCode, ActionReply)
    where
        F: Filter + 'static,
        F::Extract: Reply + Send,
    {
        let response = warp::test::request()
            .method("POST")
            .path(path)
            .json(&body)
            .reply(filter)
            .await;
        let reply = serde_json::from_slice(response.body()).unwrap();
        (response.status(), reply)
    }

    #[tokio::test]
    async fn gui_bridge_serves_payload_after_scan() {
        let survey = shared_survey();
        let filter = routes(BridgeState::new(survey.clone()));

        let (status, reply) = post(&filter, "/scan", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply.detail.unwrap()["networks"], 2);

        let response = warp::test::request()
            .method("GET")
            .path("/payload")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let model: SurveyModel = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(model.observations.len(), 2);
        assert_eq!(model.observations[1].ssid, "Hidden");
        assert_eq!(model.scan_progress, 100);
        assert!(model.heatmap.is_empty());
    }

    #[tokio::test]
    async fn gui_bridge_reports_missing_prerequisites() {
        let filter = routes(BridgeState::new(shared_survey()));

        let (status, reply) = post(&filter, "/heatmap", json!({})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(reply.status, "error");
        assert!(reply.message.contains("floor plan"));

        let (status, reply) = post(&filter, "/dead-zones", json!({})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(reply.message.contains("generate heatmap first"));

        let (status, reply) = post(&filter, "/floor-plan", json!({ "path": "site.dwg" })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(reply.message.contains("unsupported floor plan format"));
    }

    #[tokio::test]
    async fn gui_bridge_runs_heatmap_pipeline() {
        let survey = shared_survey();
        let filter = routes(BridgeState::new(survey.clone()));
        post(&filter, "/scan", json!({})).await;

        let dir = tempfile::tempdir().unwrap();
        let plan_path = dir.path().join("plan.png");
        image::RgbImage::new(300, 200).save(&plan_path).unwrap();
        let (status, _) = post(&filter, "/floor-plan", json!({ "path": plan_path })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            lock(&survey).floor_plan(),
            Some(&FloorPlan {
                path: plan_path.clone(),
                width: 300,
                height: 200,
            })
        );

        let (status, reply) =
            post(&filter, "/heatmap", json!({ "resolution": 20, "seed": 11 })).await;
        assert_eq!(status, StatusCode::OK);
        let detail = reply.detail.unwrap();
        assert_eq!((detail["rows"].as_u64(), detail["cols"].as_u64()), (Some(10), Some(15)));

        let (status, _) = post(&filter, "/dead-zones", json!({})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, reply) = post(
            &filter,
            "/simulate",
            json!({ "ap_model": "Netgear Orbi", "wall_material": "Glass", "device_count": 40 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(reply.message.contains("Access Point: Netgear Orbi"));
    }

    #[tokio::test]
    async fn gui_bridge_applies_settings_and_optimizes() {
        let survey = shared_survey();
        let filter = routes(BridgeState::new(survey.clone()));
        post(&filter, "/scan", json!({})).await;

        let (status, reply) = post(&filter, "/optimize", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply.detail.unwrap()["channel"], 6);

        let (status, _) = post(
            &filter,
            "/settings",
            json!({ "theme": "Dark", "offline": true }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(lock(&survey).settings().offline);
        assert!(!lock(&survey).can_scan());

        let (status, reply) = post(&filter, "/scan", json!({})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(reply.message.contains("offline"));
    }

    async fn payload<F>(filter: &F) -> SurveyModel
    where
        F: Filter + 'static,
        F::Extract: Reply + Send,
    {
        let response = warp::test::request()
            .method("GET")
            .path("/payload")
            .reply(filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn payload_answers_while_a_scan_settles() {
        let filter = routes(BridgeState::new(survey_with_settle(1500)));

        let reading = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let started = Instant::now();
            let model = payload(&filter).await;
            (started.elapsed(), model)
        };
        let ((status, _), (elapsed, during)) =
            tokio::join!(post(&filter, "/scan", json!({})), reading);

        assert!(elapsed < Duration::from_millis(500), "payload took {:?}", elapsed);
        assert!(during.observations.is_empty());
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload(&filter).await.observations.len(), 2);
    }

    /// Advances paused time in small steps until `done` holds or `limit` passes.
    async fn wait_for(
        state: &BridgeState,
        limit: Duration,
        done: impl Fn(&SurveyModel) -> bool,
    ) {
        let step = Duration::from_millis(250);
        let mut waited = Duration::ZERO;
        while !done(&state.model()) && waited < limit {
            tokio::time::sleep(step).await;
            waited += step;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rescan_loop_stops_when_offline() {
        let survey = shared_survey();
        let state = BridgeState::new(survey.clone());
        let period = Duration::from_secs(5);
        let rescans = tokio::spawn(rescan_loop(state.clone(), period));

        wait_for(&state, period * 4, |model| model.metrics.scans >= 2).await;
        assert!(state.model().metrics.scans >= 2);
        assert_eq!(state.model().observations.len(), 2);

        let scans = {
            let mut survey = lock(&survey);
            survey.update_settings(SettingsUpdate {
                offline: Some(true),
                ..Default::default()
            });
            survey.snapshot().metrics.scans
        };
        tokio::time::sleep(period * 4).await;
        let metrics = lock(&survey).snapshot().metrics;
        assert_eq!(metrics.scans, scans);
        assert_eq!(metrics.errors, 0);
        rescans.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn rescan_loop_skips_without_adapter() {
        let config = SurveyConfig {
            settle_ms: 0,
            ..Default::default()
        };
        let survey: SharedSurvey = Arc::new(Mutex::new(Survey::new(config, None)));
        let state = BridgeState::new(survey.clone());
        let rescans = tokio::spawn(rescan_loop(state.clone(), Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_secs(30)).await;
        let metrics = lock(&survey).snapshot().metrics;
        assert_eq!(metrics.scans, 0);
        assert_eq!(metrics.errors, 0);
        rescans.abort();
    }

    #[test]
    fn gui_bridge_publishes_status() {
        let bridge = GuiBridge::new(shared_survey());
        bridge.publish_status("bridge ready");
        assert_eq!(bridge.snapshot().status, "bridge ready");
    }
}
