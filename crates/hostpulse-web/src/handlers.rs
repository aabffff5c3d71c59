//! `/v0` API endpoints: JSON views of the latest store contents.

use std::sync::Arc;

use axum::http::Method;
use serde::Serialize;
use tracing::error;

use hostpulse_core::Store;
use hostpulse_core::models::{CpuSnapshot, MemorySnapshot, ProcessSnapshot, UptimeSnapshot};

use crate::dispatch::{Dispatcher, HttpRequest, HttpResponse, responses};

// ============================================================
// Response bodies
// ============================================================

#[derive(Debug, Serialize)]
pub struct UptimeResponse {
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
    pub total_seconds: f64,
    pub formatted: String,
}

impl From<UptimeSnapshot> for UptimeResponse {
    fn from(uptime: UptimeSnapshot) -> Self {
        Self {
            formatted: uptime.formatted(),
            hours: uptime.hours,
            minutes: uptime.minutes,
            seconds: uptime.seconds,
            total_seconds: uptime.total_seconds,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CpuResponse {
    pub id: String,
    pub usage_percent: f32,
}

impl From<CpuSnapshot> for CpuResponse {
    fn from(cpu: CpuSnapshot) -> Self {
        Self {
            id: cpu.id,
            usage_percent: cpu.usage_percent,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub pid: i32,
    pub ppid: i32,
    pub name: String,
    pub command: String,
    pub mem_usage_percent: f32,
    pub cpu_usage_percent: f32,
}

impl From<ProcessSnapshot> for ProcessResponse {
    fn from(process: ProcessSnapshot) -> Self {
        Self {
            pid: process.pid,
            ppid: process.ppid,
            name: process.name,
            command: process.command,
            mem_usage_percent: process.mem_usage_percent,
            cpu_usage_percent: process.cpu_usage_percent,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MemoryResponse {
    #[serde(rename = "total_memory_kB")]
    pub total_memory_kb: u64,
    #[serde(rename = "free_memory_kB")]
    pub free_memory_kb: u64,
    pub usage_percent: f32,
}

impl From<MemorySnapshot> for MemoryResponse {
    fn from(memory: MemorySnapshot) -> Self {
        Self {
            total_memory_kb: memory.total_kb,
            free_memory_kb: memory.free_kb,
            usage_percent: memory.usage_percent,
        }
    }
}

// ============================================================
// Endpoints
// ============================================================

/// Registers the four `/v0` routes, each reading from `store`.
pub fn register(dispatcher: &mut Dispatcher, store: Arc<Store>) {
    let s = store.clone();
    dispatcher.add_route(Method::GET, "/v0/uptime", move |req| {
        json(req, &UptimeResponse::from(s.uptime()))
    });

    let s = store.clone();
    dispatcher.add_route(Method::GET, "/v0/cpus", move |req| {
        let cpus: Vec<CpuResponse> = s.cpu_snapshots().into_iter().map(Into::into).collect();
        json(req, &cpus)
    });

    let s = store.clone();
    dispatcher.add_route(Method::GET, "/v0/procs", move |req| {
        let procs: Vec<ProcessResponse> =
            s.process_snapshots().into_iter().map(Into::into).collect();
        json(req, &procs)
    });

    dispatcher.add_route(Method::GET, "/v0/mem", move |req| {
        json(req, &MemoryResponse::from(store.memory()))
    });
}

fn json<T: Serialize>(request: &HttpRequest, body: &T) -> HttpResponse {
    match serde_json::to_string(body) {
        Ok(body) => responses::ok(request.keep_alive, body),
        Err(e) => {
            error!(uri = %request.target, error = %e, "failed to serialize response");
            responses::server_error(request.keep_alive)
        }
    }
}
