//! CameraRegistry Service
//!
//! The authoritative model of configured cameras. Owns id, port and path
//! allocation, the persisted configuration document, and the lifecycle of
//! each camera's protocol emulator and virtual network interface.
//!
//! All mutations run under a single mutex; every mutation durably writes
//! the full configuration and triggers a full topology recompilation
//! before returning.

use super::ident::{derive_path_name, generate_mac};
use super::types::{NewCameraRequest, SettingsUpdate, UpdateCameraRequest};
use crate::config_store::{
    Camera, CameraStatus, ConfigDocument, ConfigRepository, GridFusionLayout, Settings,
    StreamVariant, ONVIF_PORT_BASE,
};
use crate::error::{Error, Result};
use crate::netif::VirtualInterfaceManager;
use crate::onvif;
use crate::stream_topology::{self, TopologySink};
use rand::distributions::{Alphanumeric, DistString};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Upper bound on waiting for a camera's tasks to release their sockets
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime handle of one running camera's emulator pair
struct RunningCamera {
    /// Cooperative stop signal; the discovery responder polls it on each
    /// receive timeout, the control endpoint uses it for graceful shutdown
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    /// Virtual interface name owned by this camera, if one was provisioned
    vif: Option<String>,
}

struct RegistryInner {
    doc: ConfigDocument,
    running: HashMap<u32, RunningCamera>,
}

/// Camera registry and lifecycle manager
pub struct CameraRegistry {
    inner: Mutex<RegistryInner>,
    repo: ConfigRepository,
    netif: Arc<VirtualInterfaceManager>,
    sink: Arc<dyn TopologySink>,
}

impl CameraRegistry {
    /// Create the registry around a loaded configuration document.
    ///
    /// Generates and persists the internal relay credential on first run so
    /// topology compilation is deterministic from then on.
    pub async fn new(
        mut doc: ConfigDocument,
        repo: ConfigRepository,
        netif: Arc<VirtualInterfaceManager>,
        sink: Arc<dyn TopologySink>,
    ) -> Result<Self> {
        if doc.settings.internal_password.is_empty() {
            doc.settings.internal_password =
                Alphanumeric.sample_string(&mut rand::thread_rng(), 24);
            repo.save(&doc).await?;
            tracing::info!("Internal relay credential generated");
        }
        Ok(Self {
            inner: Mutex::new(RegistryInner {
                doc,
                running: HashMap::new(),
            }),
            repo,
            netif,
            sink,
        })
    }

    // ========================================
    // Queries
    // ========================================

    /// Snapshot of all cameras
    pub async fn list_cameras(&self) -> Vec<Camera> {
        self.inner.lock().await.doc.cameras.clone()
    }

    /// Snapshot of one camera
    pub async fn get_camera(&self, id: u32) -> Result<Camera> {
        let inner = self.inner.lock().await;
        find(&inner.doc, id).cloned()
    }

    /// Snapshot of the global settings
    pub async fn settings(&self) -> Settings {
        self.inner.lock().await.doc.settings.clone()
    }

    /// Snapshot of the grid-fusion layouts
    pub async fn list_layouts(&self) -> Vec<GridFusionLayout> {
        self.inner.lock().await.doc.grid_fusion.layouts.clone()
    }

    // ========================================
    // Mutations
    // ========================================

    /// Add a camera. Assigns id = max(existing)+1 and the next free ONVIF
    /// port from the base unless one was explicitly requested.
    pub async fn add_camera(&self, req: NewCameraRequest) -> Result<Camera> {
        if req.name.trim().is_empty() {
            return Err(Error::Validation("camera name must not be empty".into()));
        }
        if req.host.trim().is_empty() {
            return Err(Error::Validation("camera host must not be empty".into()));
        }

        let mut inner = self.inner.lock().await;

        let id = inner.doc.cameras.iter().map(|c| c.id).max().unwrap_or(0) + 1;

        let onvif_port = match req.onvif_port {
            Some(port) => {
                if !is_port_available(&inner.doc, port, None) {
                    return Err(Error::PortConflict(port));
                }
                port
            }
            None => next_free_port(&inner.doc),
        };

        let taken: Vec<String> = inner
            .doc
            .cameras
            .iter()
            .map(|c| c.path_name.clone())
            .collect();
        let path_name = derive_path_name(&req.name, &taken);

        let camera = Camera {
            id,
            name: req.name,
            path_name,
            host: req.host,
            port: req.port,
            username: req.username,
            password: req.password,
            path_main: req.path_main,
            path_sub: req.path_sub,
            onvif_port,
            onvif_username: req.onvif_username.unwrap_or_else(|| "admin".to_string()),
            onvif_password: req.onvif_password.unwrap_or_else(|| "admin".to_string()),
            mac: req.mac.unwrap_or_else(generate_mac),
            main: req.main.unwrap_or_else(StreamVariant::default_main),
            sub: req.sub.unwrap_or_else(StreamVariant::default_sub),
            virtual_interface: req.virtual_interface,
            parent_interface: req.parent_interface,
            ip_mode: req.ip_mode,
            static_ip: req.static_ip,
            static_mask: req.static_mask,
            static_gateway: req.static_gateway,
            autostart: req.autostart,
            status: CameraStatus::Stopped,
            assigned_ip: None,
        };

        inner.doc.cameras.push(camera.clone());
        self.commit(&mut inner).await?;

        tracing::info!(
            camera_id = camera.id,
            name = %camera.name,
            path_name = %camera.path_name,
            onvif_port = camera.onvif_port,
            "Camera added"
        );
        Ok(camera)
    }

    /// Update a camera. A running camera is stopped first, changes applied,
    /// then restarted. The derived path name never changes.
    pub async fn update_camera(&self, id: u32, req: UpdateCameraRequest) -> Result<Camera> {
        let mut inner = self.inner.lock().await;
        find(&inner.doc, id)?;

        if let Some(port) = req.onvif_port {
            if !is_port_available(&inner.doc, port, Some(id)) {
                return Err(Error::PortConflict(port));
            }
        }

        let was_running = inner.running.contains_key(&id);
        if was_running {
            self.stop_locked(&mut inner, id).await;
        }

        {
            let cam = find_mut(&mut inner.doc, id)?;
            if let Some(v) = req.name {
                cam.name = v;
            }
            if let Some(v) = req.host {
                cam.host = v;
            }
            if let Some(v) = req.port {
                cam.port = v;
            }
            if let Some(v) = req.username {
                cam.username = v;
            }
            if let Some(v) = req.password {
                cam.password = v;
            }
            if let Some(v) = req.path_main {
                cam.path_main = v;
            }
            if let Some(v) = req.path_sub {
                cam.path_sub = Some(v);
            }
            if let Some(v) = req.onvif_port {
                cam.onvif_port = v;
            }
            if let Some(v) = req.onvif_username {
                cam.onvif_username = v;
            }
            if let Some(v) = req.onvif_password {
                cam.onvif_password = v;
            }
            if let Some(v) = req.mac {
                cam.mac = v;
            }
            if let Some(v) = req.main {
                cam.main = v;
            }
            if let Some(v) = req.sub {
                cam.sub = v;
            }
            if let Some(v) = req.virtual_interface {
                cam.virtual_interface = v;
            }
            if let Some(v) = req.parent_interface {
                cam.parent_interface = Some(v);
            }
            if let Some(v) = req.ip_mode {
                cam.ip_mode = v;
            }
            if let Some(v) = req.static_ip {
                cam.static_ip = Some(v);
            }
            if let Some(v) = req.static_mask {
                cam.static_mask = Some(v);
            }
            if let Some(v) = req.static_gateway {
                cam.static_gateway = Some(v);
            }
            if let Some(v) = req.autostart {
                cam.autostart = v;
            }
        }

        if was_running {
            self.start_locked(&mut inner, id).await?;
        }
        self.commit(&mut inner).await?;

        let cam = find(&inner.doc, id)?.clone();
        tracing::info!(camera_id = id, restarted = was_running, "Camera updated");
        Ok(cam)
    }

    /// Delete a camera: stop it (releasing any virtual NIC), remove it,
    /// persist and recompile.
    pub async fn delete_camera(&self, id: u32) -> Result<()> {
        let mut inner = self.inner.lock().await;
        find(&inner.doc, id)?;

        self.stop_locked(&mut inner, id).await;
        inner.doc.cameras.retain(|c| c.id != id);
        self.commit(&mut inner).await?;

        tracing::info!(camera_id = id, "Camera deleted");
        Ok(())
    }

    /// Start a camera: provision its virtual NIC if requested, then its
    /// discovery responder and control endpoint. Idempotent when already
    /// running.
    pub async fn start_camera(&self, id: u32) -> Result<Camera> {
        let mut inner = self.inner.lock().await;
        find(&inner.doc, id)?;

        if inner.running.contains_key(&id) {
            return Ok(find(&inner.doc, id)?.clone());
        }

        self.start_locked(&mut inner, id).await?;
        self.commit(&mut inner).await?;
        Ok(find(&inner.doc, id)?.clone())
    }

    /// Stop a camera and release its virtual NIC. Idempotent when stopped.
    pub async fn stop_camera(&self, id: u32) -> Result<Camera> {
        let mut inner = self.inner.lock().await;
        find(&inner.doc, id)?;

        if inner.running.contains_key(&id) {
            self.stop_locked(&mut inner, id).await;
            self.commit(&mut inner).await?;
        }
        Ok(find(&inner.doc, id)?.clone())
    }

    /// Apply a partial settings update, persist and recompile. Running
    /// cameras are restarted so their emulators advertise the new server
    /// address, port and credentials instead of a stale snapshot.
    pub async fn update_settings(&self, req: SettingsUpdate) -> Result<Settings> {
        let mut inner = self.inner.lock().await;
        {
            let s = &mut inner.doc.settings;
            if let Some(v) = req.server_ip {
                s.server_ip = v;
            }
            if let Some(v) = req.rtsp_port {
                s.rtsp_port = v;
            }
            if let Some(v) = req.username {
                s.username = Some(v);
            }
            if let Some(v) = req.password {
                s.password = Some(v);
            }
            if let Some(v) = req.auth_enabled {
                s.auth_enabled = v;
            }
        }

        let running_ids: Vec<u32> = inner.running.keys().copied().collect();
        for id in running_ids {
            self.stop_locked(&mut inner, id).await;
            if let Err(e) = self.start_locked(&mut inner, id).await {
                tracing::error!(camera_id = id, error = %e, "Restart after settings update failed");
            }
        }

        self.commit(&mut inner).await?;
        tracing::info!("Settings updated");
        Ok(inner.doc.settings.clone())
    }

    /// Save (insert or replace) a grid-fusion layout, persist and recompile
    pub async fn save_layout(&self, layout: GridFusionLayout) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let layouts = &mut inner.doc.grid_fusion.layouts;
        match layouts.iter_mut().find(|l| l.id == layout.id) {
            Some(existing) => *existing = layout,
            None => layouts.push(layout),
        }
        self.commit(&mut inner).await
    }

    /// Delete a grid-fusion layout, persist and recompile
    pub async fn delete_layout(&self, layout_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let before = inner.doc.grid_fusion.layouts.len();
        inner.doc.grid_fusion.layouts.retain(|l| l.id != layout_id);
        if inner.doc.grid_fusion.layouts.len() == before {
            return Err(Error::NotFound(format!("layout {}", layout_id)));
        }
        self.commit(&mut inner).await
    }

    /// Start every camera whose persisted intent is auto-start
    pub async fn autostart(&self) -> Result<()> {
        let ids: Vec<u32> = {
            let inner = self.inner.lock().await;
            inner
                .doc
                .cameras
                .iter()
                .filter(|c| c.autostart)
                .map(|c| c.id)
                .collect()
        };
        for id in ids {
            if let Err(e) = self.start_camera(id).await {
                tracing::error!(camera_id = id, error = %e, "Auto-start failed");
            }
        }
        Ok(())
    }

    /// Stop all running cameras (process shutdown)
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        let ids: Vec<u32> = inner.running.keys().copied().collect();
        for id in ids {
            self.stop_locked(&mut inner, id).await;
        }
        if let Err(e) = self.commit(&mut inner).await {
            tracing::error!(error = %e, "Final configuration write failed");
        }
    }

    /// Compile and apply the relay topology from the current state without
    /// mutating anything (startup hook).
    pub async fn apply_topology(&self) -> Result<()> {
        let inner = self.inner.lock().await;
        let topology = stream_topology::compile(
            &inner.doc.cameras,
            &inner.doc.grid_fusion.layouts,
            &inner.doc.settings,
        );
        self.sink.apply(topology).await
    }

    // ========================================
    // Internals (caller holds the registry lock)
    // ========================================

    async fn start_locked(&self, inner: &mut RegistryInner, id: u32) -> Result<()> {
        let mut camera = find(&inner.doc, id)?.clone();

        // Virtual network identity is best-effort: failure degrades the
        // camera to the wildcard bind address, it never prevents start.
        let mut vif = None;
        let mut assigned = None;
        if camera.virtual_interface {
            match camera.parent_interface.as_deref() {
                Some(parent) => {
                    let name = VirtualInterfaceManager::interface_name(camera.id);
                    match self
                        .netif
                        .create_virtual_interface(parent, &name, &camera.mac)
                        .await
                    {
                        Ok(()) => {
                            vif = Some(name.clone());
                            assigned = self
                                .netif
                                .acquire_address(
                                    &name,
                                    camera.ip_mode,
                                    camera.static_ip.as_deref(),
                                    camera.static_mask.as_deref(),
                                    camera.static_gateway.as_deref(),
                                )
                                .await;
                            if assigned.is_none() {
                                tracing::warn!(
                                    camera_id = camera.id,
                                    interface = %name,
                                    "No address acquired, camera continues on wildcard bind"
                                );
                            }
                        }
                        Err(e) => {
                            tracing::warn!(
                                camera_id = camera.id,
                                error = %e,
                                "Virtual interface unavailable, camera continues without one"
                            );
                        }
                    }
                }
                None => {
                    tracing::warn!(
                        camera_id = camera.id,
                        "Virtual interface requested but no parent interface configured"
                    );
                }
            }
        }

        camera.status = CameraStatus::Running;
        camera.assigned_ip = assigned;

        let (stop_tx, stop_rx) = watch::channel(false);
        let settings = inner.doc.settings.clone();
        // Bind failures (port already held) surface here, before any state
        // is touched, so a failed start leaves the camera stopped.
        let server = match onvif::server::spawn(camera.clone(), settings.clone(), stop_rx.clone())
            .await
        {
            Ok(task) => task,
            Err(e) => {
                if let Some(name) = &vif {
                    self.netif.release_interface(name).await;
                }
                return Err(e);
            }
        };
        let tasks = vec![
            server,
            onvif::discovery::spawn(camera.clone(), settings, stop_rx),
        ];
        *find_mut(&mut inner.doc, id)? = camera;
        inner.running.insert(
            id,
            RunningCamera {
                stop_tx,
                tasks,
                vif,
            },
        );

        tracing::info!(
            camera_id = id,
            onvif_port = find(&inner.doc, id)?.onvif_port,
            assigned_ip = ?assigned,
            "Camera started"
        );
        Ok(())
    }

    async fn stop_locked(&self, inner: &mut RegistryInner, id: u32) {
        let Some(running) = inner.running.remove(&id) else {
            return;
        };

        // Cooperative cancellation: the responder observes the flag on its
        // next poll cycle, the control endpoint shuts down gracefully. The
        // tasks must be awaited so their sockets are released before a
        // restart rebinds the same port.
        let _ = running.stop_tx.send(true);
        for mut task in running.tasks {
            if tokio::time::timeout(STOP_TIMEOUT, &mut task).await.is_err() {
                tracing::warn!(camera_id = id, "Task did not stop in time, aborting");
                task.abort();
            }
        }

        if let Some(vif) = running.vif {
            self.netif.release_interface(&vif).await;
        }

        if let Ok(cam) = find_mut(&mut inner.doc, id) {
            cam.status = CameraStatus::Stopped;
            cam.assigned_ip = None;
        }
        tracing::info!(camera_id = id, "Camera stopped");
    }

    /// Durable write plus full topology recompilation. Allocation errors
    /// abort the mutation before this point, so commit never leaves
    /// partial state behind. Relay application failures are logged, not
    /// propagated: the configuration itself is already durable.
    async fn commit(&self, inner: &mut RegistryInner) -> Result<()> {
        self.repo.save(&inner.doc).await?;

        let topology = stream_topology::compile(
            &inner.doc.cameras,
            &inner.doc.grid_fusion.layouts,
            &inner.doc.settings,
        );
        if let Err(e) = self.sink.apply(topology).await {
            tracing::error!(error = %e, "Relay topology apply failed");
        }
        Ok(())
    }
}

fn find(doc: &ConfigDocument, id: u32) -> Result<&Camera> {
    doc.cameras
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| Error::NotFound(format!("camera {}", id)))
}

fn find_mut(doc: &mut ConfigDocument, id: u32) -> Result<&mut Camera> {
    doc.cameras
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| Error::NotFound(format!("camera {}", id)))
}

/// `true` when no camera other than `exclude_id` holds `port`
fn is_port_available(doc: &ConfigDocument, port: u16, exclude_id: Option<u32>) -> bool {
    !doc.cameras
        .iter()
        .any(|c| c.onvif_port == port && Some(c.id) != exclude_id)
}

/// Next free ONVIF port starting at the base value
fn next_free_port(doc: &ConfigDocument) -> u16 {
    let mut port = ONVIF_PORT_BASE;
    while !is_port_available(doc, port, None) {
        port += 1;
    }
    port
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream_topology::RelayTopology;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sink that records how many times the topology was recompiled
    struct CountingSink {
        applied: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TopologySink for CountingSink {
        async fn apply(&self, _topology: RelayTopology) -> Result<()> {
            self.applied.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn registry(dir: &tempfile::TempDir) -> (CameraRegistry, Arc<CountingSink>) {
        let repo = ConfigRepository::new(dir.path().join("config.json"));
        let sink = Arc::new(CountingSink {
            applied: AtomicUsize::new(0),
        });
        let registry = CameraRegistry::new(
            ConfigDocument::default(),
            repo,
            Arc::new(VirtualInterfaceManager::new()),
            sink.clone(),
        )
        .await
        .unwrap();
        (registry, sink)
    }

    fn request(name: &str) -> NewCameraRequest {
        NewCameraRequest {
            name: name.to_string(),
            host: "10.0.0.5".to_string(),
            port: 554,
            username: "admin".to_string(),
            password: "admin".to_string(),
            path_main: "/s1".to_string(),
            path_sub: None,
            onvif_port: None,
            onvif_username: None,
            onvif_password: None,
            mac: None,
            main: None,
            sub: None,
            virtual_interface: false,
            parent_interface: None,
            ip_mode: Default::default(),
            static_ip: None,
            static_mask: None,
            static_gateway: None,
            autostart: false,
        }
    }

    #[tokio::test]
    async fn add_assigns_base_port_and_derived_path_name() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(&dir).await;

        let cam = registry.add_camera(request("Front Door")).await.unwrap();
        assert!(cam.onvif_port >= ONVIF_PORT_BASE);
        assert_eq!(cam.path_name, "front_door");
        assert_eq!(cam.status, CameraStatus::Stopped);
    }

    #[tokio::test]
    async fn ids_are_unique_and_monotonic_across_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(&dir).await;

        let a = registry.add_camera(request("A")).await.unwrap();
        let b = registry.add_camera(request("B")).await.unwrap();
        assert!(b.id > a.id);

        registry.delete_camera(a.id).await.unwrap();
        let c = registry.add_camera(request("C")).await.unwrap();
        assert!(c.id > b.id);

        let ids: Vec<u32> = registry.list_cameras().await.iter().map(|c| c.id).collect();
        let mut deduped = ids.clone();
        deduped.dedup();
        assert_eq!(ids, deduped);
    }

    #[tokio::test]
    async fn auto_assigned_ports_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(&dir).await;

        let a = registry.add_camera(request("A")).await.unwrap();
        let b = registry.add_camera(request("B")).await.unwrap();
        assert_ne!(a.onvif_port, b.onvif_port);
    }

    #[tokio::test]
    async fn explicit_port_conflict_is_rejected_without_state_change() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(&dir).await;

        let mut req = request("A");
        req.onvif_port = Some(8001);
        registry.add_camera(req).await.unwrap();

        let mut req = request("B");
        req.onvif_port = Some(8001);
        let err = registry.add_camera(req).await.unwrap_err();
        assert!(matches!(err, Error::PortConflict(8001)));
        assert_eq!(registry.list_cameras().await.len(), 1);
    }

    #[tokio::test]
    async fn update_to_taken_port_fails_and_keeps_prior_port() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(&dir).await;

        let mut req = request("A");
        req.onvif_port = Some(8001);
        registry.add_camera(req).await.unwrap();
        let b = registry.add_camera(request("B")).await.unwrap();
        let b_port = b.onvif_port;

        let err = registry
            .update_camera(
                b.id,
                UpdateCameraRequest {
                    onvif_port: Some(8001),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PortConflict(8001)));
        assert_eq!(registry.get_camera(b.id).await.unwrap().onvif_port, b_port);
    }

    #[tokio::test]
    async fn update_unknown_camera_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(&dir).await;
        let err = registry
            .update_camera(99, UpdateCameraRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn path_name_survives_rename() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(&dir).await;

        let cam = registry.add_camera(request("Front Door")).await.unwrap();
        let updated = registry
            .update_camera(
                cam.id,
                UpdateCameraRequest {
                    name: Some("Back Door".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Back Door");
        assert_eq!(updated.path_name, "front_door");
    }

    #[tokio::test]
    async fn duplicate_display_names_get_distinct_path_names() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(&dir).await;

        let a = registry.add_camera(request("Gate")).await.unwrap();
        let b = registry.add_camera(request("Gate")).await.unwrap();
        assert_eq!(a.path_name, "gate");
        assert_eq!(b.path_name, "gate_2");
    }

    #[tokio::test]
    async fn every_mutation_recompiles_the_topology() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, sink) = registry(&dir).await;

        let cam = registry.add_camera(request("A")).await.unwrap();
        registry
            .update_camera(cam.id, UpdateCameraRequest::default())
            .await
            .unwrap();
        registry.delete_camera(cam.id).await.unwrap();
        assert_eq!(sink.applied.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn restart_releases_and_rebinds_the_control_port() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(&dir).await;

        let mut req = request("A");
        req.onvif_port = Some(18090);
        let cam = registry.add_camera(req).await.unwrap();
        registry.start_camera(cam.id).await.unwrap();

        // Stop-apply-restart must leave a live endpoint on the same port
        registry
            .update_camera(
                cam.id,
                UpdateCameraRequest {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let conn = tokio::net::TcpStream::connect(("127.0.0.1", 18090)).await;
        assert!(conn.is_ok(), "control endpoint dead after restart");

        registry.stop_camera(cam.id).await.unwrap();
        let conn = tokio::net::TcpStream::connect(("127.0.0.1", 18090)).await;
        assert!(conn.is_err(), "control port still bound after stop");
    }

    #[tokio::test]
    async fn running_camera_advertises_new_rtsp_port_after_settings_update() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(&dir).await;

        let mut req = request("Gate");
        req.onvif_port = Some(18091);
        let cam = registry.add_camera(req).await.unwrap();
        registry.start_camera(cam.id).await.unwrap();

        registry
            .update_settings(SettingsUpdate {
                rtsp_port: Some(9554),
                ..Default::default()
            })
            .await
            .unwrap();

        let body = "<GetStreamUri><ProfileToken>main</ProfileToken></GetStreamUri>";
        let http = format!(
            "POST /onvif/media_service HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Type: application/soap+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", 18091))
            .await
            .unwrap();
        stream.write_all(http.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.contains(":9554/"), "stale stream URI: {}", response);

        registry.stop_camera(cam.id).await.unwrap();
    }

    #[tokio::test]
    async fn start_on_an_occupied_port_fails_and_leaves_the_camera_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry(&dir).await;

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", 18092))
            .await
            .unwrap();

        let mut req = request("A");
        req.onvif_port = Some(18092);
        let cam = registry.add_camera(req).await.unwrap();
        let err = registry.start_camera(cam.id).await;
        assert!(err.is_err());
        assert_eq!(
            registry.get_camera(cam.id).await.unwrap().status,
            CameraStatus::Stopped
        );
        drop(listener);
    }

    #[tokio::test]
    async fn mutations_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ConfigRepository::new(dir.path().join("config.json"));
        {
            let (registry, _) = registry(&dir).await;
            registry.add_camera(request("Front Door")).await.unwrap();
        }
        let doc = repo.load().await.unwrap();
        assert_eq!(doc.cameras.len(), 1);
        assert_eq!(doc.cameras[0].path_name, "front_door");
        // Internal relay credential persisted by the first run
        assert!(!doc.settings.internal_password.is_empty());
    }
}
