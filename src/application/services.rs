use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    application::ports::{ClockPort, DetectorPort, FrameRendererPort, FrameSource, FrameSourcePort},
    domain::{
        camera::{CameraId, CameraMode},
        detection::{labels_of, FrameLabels},
        errors::{DomainError, DomainResult},
        feed::{FeedAction, FeedSnapshot, FeedState, FeedStatus},
        stream::{multipart_part, summarize_detections},
        summary::SummaryEntry,
    },
};

/// Espera tras un fallo de lectura de la cámara antes de reintentar.
const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Servicio dueño del estado del feed.
/// Un único mutex protege el estado y el registro de resúmenes como una sola sección crítica.
#[derive(Clone)]
pub struct FeedService {
    state: Arc<Mutex<FeedState>>,
    clock: Arc<dyn ClockPort>,
}

impl FeedService {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FeedState::new())),
            clock,
        }
    }

    // El estado queda consistente tras cada operación, así que un lock
    // envenenado se puede seguir usando.
    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Aplica `pause`, `resume` o `reload`. Las acciones desconocidas se
    /// aceptan sin efecto.
    pub fn control(&self, raw_action: &str) -> FeedStatus {
        let action = FeedAction::from(raw_action);
        let mut st = self.lock();
        if st.apply(&action) {
            info!("Feed: acción '{}' aplicada, estado {:?}", raw_action, st.status());
        } else {
            debug!("Feed: acción desconocida '{}' ignorada", raw_action);
        }
        st.status()
    }

    pub fn is_paused(&self) -> bool {
        self.lock().is_paused()
    }

    pub fn record_frame(&self, labels: FrameLabels) -> bool {
        self.lock().record_frame(labels)
    }

    /// Registro de resúmenes, del más reciente al más antiguo. Fuera de pausa
    /// añade el resumen del segundo actual si todavía no existe.
    pub fn identified_items(&self) -> Vec<SummaryEntry> {
        let now = self.clock.now_hms();
        self.lock().poll_summary(&now)
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.lock().snapshot()
    }
}

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub camera: CameraId,
    pub mode: CameraMode,
    /// Frames por segundo objetivo del stream (retardo fijo entre frames).
    pub fps: u32,
    /// Espejo horizontal, como una webcam.
    pub mirror: bool,
    pub pause_poll: Duration,
}

impl StreamSettings {
    fn frame_delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

/// Orquestador del stream: captura, inferencia, anotación y envío.
/// Cada cliente obtiene su propia cámara y su propio hilo de trabajo.
#[derive(Clone)]
pub struct StreamService {
    frames: Arc<dyn FrameSourcePort>,
    detector: Arc<Mutex<Box<dyn DetectorPort>>>,
    renderer: Arc<dyn FrameRendererPort>,
    feed: FeedService,
    settings: StreamSettings,
}

impl StreamService {
    pub fn new(
        frames: Arc<dyn FrameSourcePort>,
        detector: Box<dyn DetectorPort>,
        renderer: Arc<dyn FrameRendererPort>,
        feed: FeedService,
        settings: StreamSettings,
    ) -> Self {
        Self {
            frames,
            detector: Arc::new(Mutex::new(detector)),
            renderer,
            feed,
            settings,
        }
    }

    /// Abre la cámara y lanza el hilo que produce las partes multipart.
    /// El hilo termina, y libera la cámara, cuando se suelta el receptor.
    pub async fn open(&self) -> DomainResult<mpsc::Receiver<Vec<u8>>> {
        let frames = self.frames.clone();
        let camera = self.settings.camera.clone();
        let mode = self.settings.mode.clone();
        let source = tokio::task::spawn_blocking(move || frames.open(&camera, &mode))
            .await
            .map_err(|e| DomainError::OperationFailed(format!("apertura de cámara abortada: {e}")))??;

        let (tx, rx) = mpsc::channel(2);
        let worker = self.clone();
        std::thread::Builder::new()
            .name("feed-stream".into())
            .spawn(move || worker.run(source, tx))
            .map_err(|e| DomainError::OperationFailed(format!("no se pudo lanzar el hilo: {e}")))?;

        Ok(rx)
    }

    fn run(self, mut source: Box<dyn FrameSource>, tx: mpsc::Sender<Vec<u8>>) {
        info!("Stream: cliente conectado en {}", self.settings.camera.path);
        let frame_delay = self.settings.frame_delay();

        while !tx.is_closed() {
            if self.feed.is_paused() {
                std::thread::sleep(self.settings.pause_poll);
                continue;
            }

            // Un fallo de lectura no corta el stream: se reintenta sin emitir nada.
            let mut frame = match source.next_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Error capturando frame: {}", e);
                    std::thread::sleep(READ_RETRY_DELAY);
                    continue;
                }
            };

            if self.settings.mirror {
                image::imageops::flip_horizontal_in_place(&mut frame);
            }

            let detections = {
                let mut detector = self.detector.lock().unwrap_or_else(PoisonError::into_inner);
                detector.detect(&frame)
            };
            let detections = match detections {
                Ok(d) => d,
                Err(e) => {
                    error!("Error de inferencia, cerrando stream: {:?}", e);
                    break;
                }
            };

            self.feed.record_frame(labels_of(&detections));
            debug!("Frame: [{}]", summarize_detections(&detections));

            let jpeg = match self.renderer.render(&mut frame, &detections) {
                Ok(jpeg) => jpeg,
                Err(e) => {
                    error!("Error codificando frame, cerrando stream: {:?}", e);
                    break;
                }
            };

            if tx.blocking_send(multipart_part(&jpeg)).is_err() {
                break;
            }
            std::thread::sleep(frame_delay);
        }

        info!("Stream: cliente desconectado, liberando {}", self.settings.camera.path);
    }
}
