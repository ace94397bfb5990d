//! Single binary web server: live scoring API for kyudo tournaments.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default so the app is reachable from the
//! scoring stations on the venue network.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080).

use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use kyudo_tournament_web::{
    categorize, final_rankings, partition_standings, rank_slot_choices, ArcherId, ArrowResult,
    DistanceHeat, Division, DivisionId, EliminationHeat, Gender, Grade, HeatStore,
    MemoryHeatStore, Partition, RankGroup, ScoredArcher, Tournament, TournamentConfig,
    TournamentError, TournamentId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Per-tournament entry: tournament data + last activity time (for auto-cleanup).
struct TournamentEntry {
    tournament: Tournament,
    last_activity: Instant,
}

/// In-memory state: many tournaments by ID. Entries are removed after 12h inactivity.
type AppState = Data<RwLock<HashMap<TournamentId, TournamentEntry>>>;

/// Shared shoot-off storage, polled by every scoring station.
type Heats = Data<MemoryHeatStore>;

/// Inactivity threshold: tournaments not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct DivisionBody {
    label: String,
    min_grade: Grade,
    max_grade: Grade,
    #[serde(default)]
    separate_by_gender: Option<bool>,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    #[serde(default)]
    divisions: Vec<DivisionBody>,
    #[serde(default = "default_award_rank_limit")]
    award_rank_limit: u32,
    #[serde(default = "default_arrows")]
    arrows_round_1: usize,
    #[serde(default = "default_arrows")]
    arrows_round_2: usize,
    #[serde(default)]
    separate_by_gender: bool,
}

fn default_award_rank_limit() -> u32 {
    3
}

fn default_arrows() -> usize {
    4
}

#[derive(Deserialize)]
struct AddArcherBody {
    name: String,
    grade: Grade,
    #[serde(default)]
    gender: Option<Gender>,
}

#[derive(Deserialize)]
struct SetArrowBody {
    round: u8,
    index: usize,
    result: ArrowResult,
}

#[derive(Deserialize)]
struct OutcomeBody {
    archer_id: ArcherId,
    result: ArrowResult,
}

#[derive(Deserialize)]
struct EliminationHeatBody {
    division_id: DivisionId,
    participants: Vec<ArcherId>,
    /// Outcome table, one inner list per round in shooting order.
    rounds: Vec<Vec<OutcomeBody>>,
}

#[derive(Deserialize)]
struct DistanceEntryBody {
    archer_id: ArcherId,
    #[serde(default)]
    measurement: Option<f64>,
    #[serde(default)]
    defeated: bool,
}

#[derive(Deserialize)]
struct DistanceHeatBody {
    division_id: DivisionId,
    target_rank: u32,
    entries: Vec<DistanceEntryBody>,
}

#[derive(Deserialize)]
struct SlotQuery {
    target_rank: u32,
    group_size: usize,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and archer id.
#[derive(Deserialize)]
struct TournamentArcherPath {
    id: TournamentId,
    archer_id: ArcherId,
}

/// Standings view: one partition with its rows and categorized tie groups.
#[derive(Serialize)]
struct CategorizedPartition {
    partition: Partition,
    rows: Vec<ScoredArcher>,
    groups: Vec<RankGroup>,
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "kyudo-tournament-web",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Create a new tournament (returns it with id; clients store the id for
/// subsequent requests).
#[post("/api/tournaments")]
async fn api_create_tournament(
    state: AppState,
    body: Option<Json<CreateTournamentBody>>,
) -> HttpResponse {
    let config = match body {
        Some(b) => {
            let b = b.into_inner();
            TournamentConfig {
                divisions: b
                    .divisions
                    .into_iter()
                    .map(|d| {
                        let mut division = Division::new(d.label, d.min_grade, d.max_grade);
                        division.separate_by_gender = d.separate_by_gender;
                        division
                    })
                    .collect(),
                award_rank_limit: b.award_rank_limit,
                arrows_round_1: b.arrows_round_1,
                arrows_round_2: b.arrows_round_2,
                separate_by_gender: b.separate_by_gender,
            }
        }
        None => TournamentConfig::default(),
    };
    let tournament = Tournament::new(config);
    let id = tournament.id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    g.insert(
        id,
        TournamentEntry {
            tournament,
            last_activity: Instant::now(),
        },
    );
    HttpResponse::Ok().json(&g.get(&id).unwrap().tournament)
}

/// Get a tournament by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(&entry.tournament)
        }
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    }
}

/// Check in an archer.
#[post("/api/tournaments/{id}/archers")]
async fn api_add_archer(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<AddArcherBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match t.add_archer(body.name.trim(), body.grade, body.gender) {
        Ok(_) => HttpResponse::Ok().json(t),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Remove a checked-in archer.
#[delete("/api/tournaments/{id}/archers/{archer_id}")]
async fn api_remove_archer(state: AppState, path: Path<TournamentArcherPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match t.remove_archer(path.archer_id) {
        Ok(()) => HttpResponse::Ok().json(t),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Record one arrow outcome for an archer.
#[put("/api/tournaments/{id}/archers/{archer_id}/arrows")]
async fn api_set_arrow(
    state: AppState,
    path: Path<TournamentArcherPath>,
    body: Json<SetArrowBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match t.set_arrow(path.archer_id, body.round, body.index, body.result) {
        Ok(()) => HttpResponse::Ok().json(t),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Current standings: per-partition hit counts and categorized tie groups.
#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &entry.tournament;
    let view: Vec<CategorizedPartition> = partition_standings(t)
        .into_iter()
        .map(|standings| {
            let groups = categorize(&standings, t.config.award_rank_limit);
            CategorizedPartition {
                partition: standings.partition,
                rows: standings.rows,
                groups,
            }
        })
        .collect();
    HttpResponse::Ok().json(view)
}

/// Final rankings: standings merged with all saved shoot-off results.
/// Pure re-derivation; safe to poll at any cadence.
#[get("/api/tournaments/{id}/rankings")]
async fn api_rankings(state: AppState, heats: Heats, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let shootoff = match heats.shootoff_results(path.id) {
        Ok(s) => s,
        Err(e) => {
            return HttpResponse::ServiceUnavailable()
                .json(serde_json::json!({ "error": e.to_string() }))
        }
    };
    HttpResponse::Ok().json(final_rankings(&entry.tournament, &shootoff))
}

/// All saved shoot-off results for the tournament.
#[get("/api/tournaments/{id}/heats")]
async fn api_get_heats(heats: Heats, path: Path<TournamentPath>) -> HttpResponse {
    match heats.shootoff_results(path.id) {
        Ok(s) => HttpResponse::Ok().json(s),
        Err(e) => {
            HttpResponse::ServiceUnavailable().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

/// Submit a finished elimination shoot-off as its round-by-round outcome
/// table. The server replays the table from scratch; an inconsistent or
/// undecided heat is rejected before anything is persisted.
#[post("/api/tournaments/{id}/heats/elimination")]
async fn api_save_elimination_heat(
    state: AppState,
    heats: Heats,
    path: Path<TournamentPath>,
    body: Json<EliminationHeatBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &entry.tournament;
    if let Err(e) = validate_heat_members(t, body.division_id, &body.participants) {
        return HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }));
    }

    let body = body.into_inner();
    let rounds: Vec<Vec<(ArcherId, ArrowResult)>> = body
        .rounds
        .iter()
        .map(|round| round.iter().map(|o| (o.archer_id, o.result)).collect())
        .collect();
    let heat = match EliminationHeat::from_rounds(body.division_id, body.participants, rounds) {
        Ok(h) => h,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
        }
    };
    let records = match heat.records() {
        Ok(r) => r,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
        }
    };
    if let Err(e) = heats.save_elimination_heat(path.id, records.clone(), chrono::Utc::now()) {
        return HttpResponse::ServiceUnavailable()
            .json(serde_json::json!({ "error": e.to_string() }));
    }
    HttpResponse::Ok().json(serde_json::json!({
        "state": heat.state(),
        "records": records,
        "pending_distance_groups": heat.pending_distance_groups(),
    }))
}

/// Submit a completed distance shoot-off: one measurement or defeated mark
/// per participant. Re-submitting for the same target rank slot replaces
/// the earlier save.
#[post("/api/tournaments/{id}/heats/distance")]
async fn api_save_distance_heat(
    state: AppState,
    heats: Heats,
    path: Path<TournamentPath>,
    body: Json<DistanceHeatBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &entry.tournament;
    let participants: Vec<ArcherId> = body.entries.iter().map(|e| e.archer_id).collect();
    if let Err(e) = validate_heat_members(t, body.division_id, &participants) {
        return HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }));
    }

    let result = (|| {
        let mut heat = DistanceHeat::new(body.division_id, body.target_rank, participants)?;
        for e in &body.entries {
            match (e.defeated, e.measurement) {
                (true, _) => heat.record_defeated(e.archer_id)?,
                (false, Some(m)) => heat.record_measurement(e.archer_id, m)?,
                (false, None) => {}
            }
        }
        heat.records()
    })();
    let records = match result {
        Ok(r) => r,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
        }
    };
    if let Err(e) = heats.save_distance_heat(path.id, body.target_rank, records.clone()) {
        return HttpResponse::ServiceUnavailable()
            .json(serde_json::json!({ "error": e.to_string() }));
    }
    HttpResponse::Ok().json(serde_json::json!({ "records": records }))
}

/// Rank slot choices for a distance heat the operator is convening.
#[get("/api/tournaments/{id}/heats/distance/slots")]
async fn api_distance_slots(
    state: AppState,
    path: Path<TournamentPath>,
    query: Query<SlotQuery>,
) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    let limit = entry.tournament.config.award_rank_limit;
    HttpResponse::Ok().json(rank_slot_choices(query.target_rank, query.group_size, limit))
}

/// Full reset of all shoot-off state for the tournament. Irreversible;
/// elimination and distance records are cleared together.
#[delete("/api/tournaments/{id}/heats")]
async fn api_delete_heats(heats: Heats, path: Path<TournamentPath>) -> HttpResponse {
    match heats.delete_all_shootoff_results(path.id) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "deleted": true })),
        Err(e) => {
            HttpResponse::ServiceUnavailable().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

/// Heats may only be saved for a configured division, and every participant
/// must be a checked-in archer.
fn validate_heat_members(
    tournament: &Tournament,
    division_id: DivisionId,
    participants: &[ArcherId],
) -> Result<(), TournamentError> {
    if tournament.division(division_id).is_none() {
        return Err(TournamentError::DivisionNotFound(division_id));
    }
    for &id in participants {
        if tournament.archer(id).is_none() {
            return Err(TournamentError::ArcherNotFound(id));
        }
    }
    Ok(())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(HashMap::<TournamentId, TournamentEntry>::new()));
    let heats = Data::new(MemoryHeatStore::new());

    // Background task: every 30 minutes, remove tournaments inactive for 12+
    // hours, together with their shoot-off results.
    let state_cleanup = state.clone();
    let heats_cleanup = heats.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let removed: Vec<TournamentId> = {
                let mut g = match state_cleanup.write() {
                    Ok(guard) => guard,
                    Err(_) => continue,
                };
                let stale: Vec<TournamentId> = g
                    .iter()
                    .filter(|(_, entry)| entry.last_activity.elapsed() >= INACTIVITY_TIMEOUT)
                    .map(|(id, _)| *id)
                    .collect();
                for id in &stale {
                    g.remove(id);
                }
                stale
            };
            for id in &removed {
                if let Err(e) = heats_cleanup.delete_all_shootoff_results(*id) {
                    log::warn!("Failed to clear shoot-off results for {}: {}", id, e);
                }
            }
            if !removed.is_empty() {
                log::info!(
                    "Cleaned up {} inactive tournament(s) (no activity for 12h)",
                    removed.len()
                );
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(heats.clone())
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_add_archer)
            .service(api_remove_archer)
            .service(api_set_arrow)
            .service(api_standings)
            .service(api_rankings)
            .service(api_get_heats)
            .service(api_save_elimination_heat)
            .service(api_save_distance_heat)
            .service(api_distance_slots)
            .service(api_delete_heats)
    })
    .bind(bind)?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
