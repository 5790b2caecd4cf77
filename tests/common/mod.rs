//! Test helpers for integration tests.
//!
//! Builds engines, services and HTTP test servers over the in-memory
//! backend and tree store.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;

use dspace::transfer::ChunkLimits;
use dspace::vdir::{MemoryTreeStore, Record, TreeStore};
use dspace::web::{create_health_router, create_router, AppState};
use dspace::{DestinationRotator, DriveService, MemoryBackend, TransferEngine, TransferSettings};

pub const MB: usize = 1024 * 1024;

/// Chunk limits small enough to split test payloads.
pub const SMALL_LIMITS: ChunkLimits = ChunkLimits {
    ceiling: 16,
    chunk_size: 8,
};

/// Build transfer settings with a negligible backoff.
pub fn settings(limits: ChunkLimits, attempts: u32) -> TransferSettings {
    TransferSettings {
        limits,
        attempts,
        backoff: Duration::from_millis(1),
    }
}

/// Build an engine over `backend` rotating across `destinations`.
pub fn build_engine(
    backend: Arc<MemoryBackend>,
    destinations: &[&str],
    settings: TransferSettings,
) -> TransferEngine {
    let rotator = DestinationRotator::new(destinations.iter().map(|d| d.to_string()).collect())
        .expect("at least one destination");
    TransferEngine::new(backend, Arc::new(rotator), settings)
}

/// Build a drive service over an initialized in-memory store.
pub fn build_service(backend: Arc<MemoryBackend>) -> DriveService {
    build_service_with_store(backend, Arc::new(MemoryTreeStore::initialized()))
}

/// Build a drive service over the given store.
pub fn build_service_with_store(
    backend: Arc<MemoryBackend>,
    store: Arc<dyn TreeStore>,
) -> DriveService {
    let engine = build_engine(backend, &["chan-a", "chan-b"], settings(SMALL_LIMITS, 3));
    DriveService::new(engine, store)
}

/// Create a test server with the full router.
pub fn create_test_server_with(service: DriveService) -> TestServer {
    let app_state = Arc::new(AppState::new(service));
    let router = create_router(app_state, &[], 64 * MB).merge(create_health_router());
    TestServer::new(router).expect("Failed to create test server")
}

/// Create a test server over a fresh in-memory backend.
pub fn create_test_server() -> (TestServer, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let server = create_test_server_with(build_service(backend.clone()));
    (server, backend)
}

/// Skeleton of a job with one top-level file and one nested file.
pub fn job_skeleton(job_id: &str) -> Record {
    let root = format!("root\\{job_id}");
    Record::directory("", "photos", root.clone(), Some(job_id.to_string()))
        .with_child(Record::file("", "a.txt", format!("{root}\\a.txt"), None, 0))
        .with_child(
            Record::directory("", "sub", format!("{root}\\sub"), None).with_child(Record::file(
                "",
                "b.bin",
                format!("{root}\\sub\\b.bin"),
                None,
                0,
            )),
        )
}

/// Deterministic payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
