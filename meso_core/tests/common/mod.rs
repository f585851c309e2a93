//! In-memory stand-in for the remote routine service.

#![allow(dead_code)]

use meso_core::{ApiRequest, ApiResponse, Method, Result, Transport};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct StoredRoutine {
    pub id: String,
    pub title: String,
    pub folder_id: Option<u64>,
    pub body: Value,
}

#[derive(Default)]
struct State {
    folders: Vec<(u64, String)>,
    routines: Vec<StoredRoutine>,
    next_id: u64,
    requests: Vec<ApiRequest>,
    /// Responses returned (in order) to writes before normal handling resumes
    scripted: VecDeque<ApiResponse>,
}

/// Fake service; `omit_page_count` mimics listings without `page_count`,
/// `advertised_page_count` replaces the real count in every listing
#[derive(Default)]
pub struct FakeService {
    state: RefCell<State>,
    pub omit_page_count: bool,
    pub advertised_page_count: Option<usize>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_page_count() -> Self {
        Self {
            omit_page_count: true,
            ..Self::default()
        }
    }

    pub fn with_page_count(page_count: usize) -> Self {
        Self {
            advertised_page_count: Some(page_count),
            ..Self::default()
        }
    }

    pub fn add_folder(&self, id: u64, title: &str) {
        self.state.borrow_mut().folders.push((id, title.to_string()));
    }

    pub fn add_routine(&self, id: &str, title: &str, folder_id: Option<u64>) {
        self.state.borrow_mut().routines.push(StoredRoutine {
            id: id.to_string(),
            title: title.to_string(),
            folder_id,
            body: Value::Null,
        });
    }

    /// Queue responses that preempt the next writes; reads are unaffected
    pub fn script(&self, responses: impl IntoIterator<Item = ApiResponse>) {
        self.state.borrow_mut().scripted.extend(responses);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.borrow().requests.clone()
    }

    pub fn writes(&self) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != Method::Get)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.borrow_mut().requests.clear();
    }

    pub fn routines(&self) -> Vec<StoredRoutine> {
        self.state.borrow().routines.clone()
    }

    pub fn folders(&self) -> Vec<(u64, String)> {
        self.state.borrow().folders.clone()
    }

    fn page_params(request: &ApiRequest) -> (usize, usize) {
        let get = |key: &str| {
            request
                .query
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| v.parse::<usize>().ok())
        };
        (get("page").unwrap_or(1), get("pageSize").unwrap_or(10))
    }

    fn page<T: Clone>(&self, items: &[T], request: &ApiRequest) -> (Vec<T>, usize) {
        let (page, size) = Self::page_params(request);
        let start = (page - 1) * size;
        let slice = items.iter().skip(start).take(size).cloned().collect();
        let page_count = items.len().div_ceil(size).max(1);
        (slice, page_count)
    }

    fn listing(&self, key: &str, items: Vec<Value>, page_count: usize) -> Value {
        let mut body = json!({ key: items });
        if !self.omit_page_count {
            let page_count = self.advertised_page_count.unwrap_or(page_count);
            body["page_count"] = json!(page_count);
        }
        body
    }
}

impl Transport for FakeService {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.state.borrow_mut().requests.push(request.clone());

        if request.method != Method::Get {
            let scripted = self.state.borrow_mut().scripted.pop_front();
            if let Some(response) = scripted {
                return Ok(response);
            }
        }

        let path = request.path.as_str();
        let response = match (request.method, path) {
            (Method::Get, "/v1/routine_folders") => {
                let folders = self.folders();
                let (slice, page_count) = self.page(&folders, request);
                let items = slice
                    .into_iter()
                    .map(|(id, title)| json!({"id": id, "title": title, "index": 0}))
                    .collect();
                ApiResponse::Success(self.listing("routine_folders", items, page_count))
            }
            (Method::Post, "/v1/routine_folders") => {
                let title = request.body.as_ref().unwrap()["routine_folder"]["title"]
                    .as_str()
                    .unwrap()
                    .to_string();
                let mut state = self.state.borrow_mut();
                state.next_id += 1;
                let id = 1000 + state.next_id;
                state.folders.push((id, title.clone()));
                ApiResponse::Success(json!({"routine_folder": {"id": id, "title": title}}))
            }
            (Method::Get, "/v1/routines") => {
                let routines = self.routines();
                let (slice, page_count) = self.page(&routines, request);
                let items = slice
                    .into_iter()
                    .map(|r| json!({"id": r.id, "title": r.title, "folder_id": r.folder_id}))
                    .collect();
                ApiResponse::Success(self.listing("routines", items, page_count))
            }
            (Method::Post, "/v1/routines") => {
                let body = request.body.clone().unwrap();
                let routine = &body["routine"];
                let mut state = self.state.borrow_mut();
                state.next_id += 1;
                let id = format!("routine-{}", state.next_id);
                state.routines.push(StoredRoutine {
                    id: id.clone(),
                    title: routine["title"].as_str().unwrap().to_string(),
                    folder_id: routine["folder_id"].as_u64(),
                    body: body.clone(),
                });
                ApiResponse::Success(json!({"routine": [{"id": id, "title": routine["title"]}]}))
            }
            (Method::Put, p) if p.starts_with("/v1/routines/") => {
                let id = &p["/v1/routines/".len()..];
                let body = request.body.clone().unwrap();
                if body["routine"].get("folder_id").is_some() {
                    return Ok(ApiResponse::Failure {
                        status: 400,
                        body: "folder_id is not allowed".into(),
                    });
                }
                let mut state = self.state.borrow_mut();
                match state.routines.iter_mut().find(|r| r.id == id) {
                    Some(stored) => {
                        stored.body = body;
                        ApiResponse::Success(json!({"routine": [{"id": id}]}))
                    }
                    None => ApiResponse::Failure {
                        status: 404,
                        body: "not found".into(),
                    },
                }
            }
            _ => ApiResponse::Failure {
                status: 404,
                body: format!("no route for {:?} {}", request.method, path),
            },
        };

        Ok(response)
    }
}
