//! Career path catalog and course graph endpoints.
//!
//! `/api/degrees/{degree}/...` serves any degree; `/api/careers` and
//! `/api/courses` are the CS/CSE shorthands. Graph view state lives with the
//! viewer. GET derives it from the query
//! string; POST takes the current view plus an action and returns the
//! updated view together with the rendered layout.

use axum::extract::{Path, Query, State};
use axum::Json;
use bobcats_careers::{prerequisite_graph, CareerPath, GraphView, LayoutMode, Position, DEFAULT_DEGREE};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ok, ActionResult};
use crate::state::SharedState;

// ── Catalog ───────────────────────────────────────────────────────────────────

/// GET /api/degrees
pub async fn list_degrees(State(state): State<SharedState>) -> ActionResult<Value> {
    ok(json!({ "degrees": state.catalog.degrees() }))
}

/// GET /api/degrees/{degree}
pub async fn get_degree(State(state): State<SharedState>, Path(degree): Path<String>) -> ActionResult<Value> {
    let found = state.catalog.degree(&degree)?;
    ok(json!({
        "id": degree,
        "name": found.name,
        "careers": found.career_summaries(),
        "course_count": found.courses.len(),
    }))
}

/// GET /api/careers
pub async fn list_paths(State(state): State<SharedState>) -> ActionResult<Value> {
    ok(json!({ "careers": state.catalog.summaries() }))
}

/// GET /api/careers/{id}
pub async fn get_path(State(state): State<SharedState>, Path(id): Path<String>) -> ActionResult<Value> {
    career(&state, DEFAULT_DEGREE, id)
}

/// GET /api/degrees/{degree}/careers/{id}
pub async fn get_degree_path(
    State(state): State<SharedState>,
    Path((degree, id)): Path<(String, String)>,
) -> ActionResult<Value> {
    career(&state, &degree, id)
}

fn career(state: &SharedState, degree: &str, id: String) -> ActionResult<Value> {
    let path = state.catalog.degree_path(degree, &id)?;
    ok(json!({ "degree": degree, "id": id, "career": path }))
}

// ── Layout ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LayoutQuery {
    /// Comma-separated tier ids, e.g. `tier-1,tier-3`.
    pub expanded: Option<String>,
    pub formatted: bool,
}

impl LayoutQuery {
    fn into_view(self, graph_id: &str, path: &CareerPath) -> GraphView {
        let mut view = GraphView::new();
        for tier in self.expanded.iter().flat_map(|s| s.split(',')).map(str::trim).filter(|s| !s.is_empty()) {
            view.toggle(tier);
        }
        if self.formatted {
            view.format(graph_id, path);
        }
        view
    }
}

/// GET /api/careers/{id}/layout?expanded=tier-1,tier-2&formatted=true
pub async fn get_layout(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<LayoutQuery>,
) -> ActionResult<Value> {
    layout(&state, DEFAULT_DEGREE, &id, query)
}

/// GET /api/degrees/{degree}/careers/{id}/layout
pub async fn get_degree_layout(
    State(state): State<SharedState>,
    Path((degree, id)): Path<(String, String)>,
    Query(query): Query<LayoutQuery>,
) -> ActionResult<Value> {
    layout(&state, &degree, &id, query)
}

fn layout(state: &SharedState, degree: &str, id: &str, query: LayoutQuery) -> ActionResult<Value> {
    let path = state.catalog.degree_path(degree, id)?;
    let view = query.into_view(id, path);
    ok(json!({ "view": &view, "layout": view.render(id, path) }))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewAction {
    Toggle { tier: String },
    #[serde(rename_all = "camelCase")]
    DragStop { node_id: String, position: Position },
    Reset,
    Format,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ViewRequest {
    pub view: GraphView,
    pub action: Option<ViewAction>,
}

/// POST /api/careers/{id}/layout
pub async fn apply_view_action(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<ViewRequest>,
) -> ActionResult<Value> {
    view_action(&state, DEFAULT_DEGREE, &id, body)
}

/// POST /api/degrees/{degree}/careers/{id}/layout
pub async fn apply_degree_view_action(
    State(state): State<SharedState>,
    Path((degree, id)): Path<(String, String)>,
    Json(body): Json<ViewRequest>,
) -> ActionResult<Value> {
    view_action(&state, &degree, &id, body)
}

fn view_action(state: &SharedState, degree: &str, id: &str, body: ViewRequest) -> ActionResult<Value> {
    let path = state.catalog.degree_path(degree, id)?;
    let mut view = body.view;
    match body.action {
        Some(ViewAction::Toggle { tier }) => {
            view.toggle(&tier);
        }
        Some(ViewAction::DragStop { node_id, position }) => view.drag_stop(&node_id, position),
        Some(ViewAction::Reset) => view.reset(),
        Some(ViewAction::Format) => view.format(id, path),
        None => {}
    }
    let layout = view.render(id, path);
    ok(json!({ "view": view, "layout": layout }))
}

// ── Courses ───────────────────────────────────────────────────────────────────

/// GET /api/courses
pub async fn list_courses(State(state): State<SharedState>) -> ActionResult<Value> {
    ok(json!({ "courses": state.catalog.courses() }))
}

/// GET /api/degrees/{degree}/courses
pub async fn list_degree_courses(
    State(state): State<SharedState>,
    Path(degree): Path<String>,
) -> ActionResult<Value> {
    ok(json!({ "degree": degree, "courses": state.catalog.degree(&degree)?.courses }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GraphQuery {
    pub formatted: bool,
}

impl GraphQuery {
    fn mode(&self) -> LayoutMode {
        if self.formatted { LayoutMode::Formatted } else { LayoutMode::Compact }
    }
}

/// GET /api/courses/graph
pub async fn course_graph(State(state): State<SharedState>, Query(query): Query<GraphQuery>) -> ActionResult<Value> {
    ok(json!({ "graph": prerequisite_graph(state.catalog.courses(), query.mode()) }))
}

/// GET /api/degrees/{degree}/courses/graph
pub async fn degree_course_graph(
    State(state): State<SharedState>,
    Path(degree): Path<String>,
    Query(query): Query<GraphQuery>,
) -> ActionResult<Value> {
    let courses = &state.catalog.degree(&degree)?.courses;
    ok(json!({ "degree": degree, "graph": prerequisite_graph(courses, query.mode()) }))
}

/// GET /api/courses/{id}
pub async fn get_course(State(state): State<SharedState>, Path(id): Path<String>) -> ActionResult<Value> {
    let course = state.catalog.course(&id)?;
    ok(json!({ "course": course }))
}

/// GET /api/degrees/{degree}/courses/{id}
pub async fn get_degree_course(
    State(state): State<SharedState>,
    Path((degree, id)): Path<(String, String)>,
) -> ActionResult<Value> {
    let course = state.catalog.degree_course(&degree, &id)?;
    ok(json!({ "degree": degree, "course": course }))
}
