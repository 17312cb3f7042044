//! Atualização periódica da tela de solicitações ao vivo
//!
//! Ao ativar a tela, carrega a listagem uma vez (notificando falhas) e agenda
//! recargas silenciosas a cada intervalo. Parar o temporizador não cancela uma
//! busca em andamento; encerrar a tela descarta o que chegar depois.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use emergency_core::RequestCollection;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::controller::RequestListController;
use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Stopped,
    Running,
}

struct PollTimer {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl PollTimer {
    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Estado protegido por um único lock: visibilidade, ativação e temporizador
/// mudam juntos
struct PollSlot {
    timer: Option<PollTimer>,
    visible: bool,
    activating: bool,
}

impl PollSlot {
    fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(PollTimer::is_running)
    }
}

pub struct LivePollingController {
    list: Arc<RequestListController>,
    interval: Duration,
    slot: Mutex<PollSlot>,
    closed: AtomicBool,
}

impl LivePollingController {
    pub fn new(list: Arc<RequestListController>, interval: Duration) -> Self {
        Self {
            list,
            interval,
            slot: Mutex::new(PollSlot {
                timer: None,
                visible: true,
                activating: false,
            }),
            closed: AtomicBool::new(false),
        }
    }

    pub fn list(&self) -> &Arc<RequestListController> {
        &self.list
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Carga inicial seguida do temporizador. O temporizador é iniciado
    /// mesmo quando a carga inicial falha, desde que a tela esteja visível
    /// quando a carga termina.
    pub async fn activate(&self) -> Result<Arc<RequestCollection>, FetchError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(FetchError::ViewClosed);
        }

        self.slot().activating = true;
        let activation = Activation { polling: self };
        let result = self.list.load().await;

        {
            let mut slot = self.slot();
            slot.activating = false;
            if slot.visible && !self.closed.load(Ordering::SeqCst) {
                self.start_timer(&mut slot, false);
            } else {
                debug!(view = %self.list.view_id(), "Tela oculta; temporizador não iniciado");
            }
        }
        drop(activation);
        result
    }

    /// Inicia o temporizador com uma recarga imediata
    pub fn start(&self) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        let mut slot = self.slot();
        self.start_timer(&mut slot, true)
    }

    /// Para o temporizador; devolve `false` se já estava parado
    pub fn stop(&self) -> bool {
        let mut slot = self.slot();
        self.stop_timer(&mut slot)
    }

    pub fn state(&self) -> PollState {
        if self.slot().is_running() {
            PollState::Running
        } else {
            PollState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == PollState::Running
    }

    /// Tela oculta para o temporizador; tela visível de novo recarrega na hora.
    ///
    /// Durante a carga de [`activate`](Self::activate) apenas a visibilidade é
    /// registrada: quem decide iniciar o temporizador é a própria ativação.
    pub fn set_visible(&self, visible: bool) {
        let mut slot = self.slot();
        slot.visible = visible;

        if !visible {
            self.stop_timer(&mut slot);
        } else if !slot.activating && !slot.is_running() && !self.closed.load(Ordering::SeqCst) {
            self.start_timer(&mut slot, true);
        }
    }

    pub fn teardown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.stop();
        self.list.teardown();
    }

    fn start_timer(&self, slot: &mut PollSlot, immediate: bool) -> bool {
        if slot.is_running() {
            return false;
        }

        let (stop, stop_signal) = oneshot::channel();
        let handle = tokio::spawn(run_poll_loop(
            Arc::clone(&self.list),
            self.interval,
            immediate,
            stop_signal,
        ));
        slot.timer = Some(PollTimer { stop, handle });

        info!(
            view = %self.list.view_id(),
            "Atualização automática a cada {}s", self.interval.as_secs()
        );
        true
    }

    fn stop_timer(&self, slot: &mut PollSlot) -> bool {
        match slot.timer.take() {
            Some(timer) => {
                // O laço pode já ter terminado sozinho
                let _ = timer.stop.send(());
                drop(timer.handle);
                info!(view = %self.list.view_id(), "Atualização automática parada");
                true
            }
            None => false,
        }
    }

    fn slot(&self) -> MutexGuard<'_, PollSlot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for LivePollingController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Marca a ativação em andamento, inclusive se a futura for abandonada
struct Activation<'a> {
    polling: &'a LivePollingController,
}

impl Drop for Activation<'_> {
    fn drop(&mut self) {
        self.polling.slot().activating = false;
    }
}

async fn run_poll_loop(
    list: Arc<RequestListController>,
    period: Duration,
    immediate: bool,
    mut stop: oneshot::Receiver<()>,
) {
    let first_tick = if immediate {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            // Sinal enviado ou controlador descartado
            _ = &mut stop => break,
            _ = ticker.tick() => {
                if let Err(FetchError::ViewClosed) = list.refresh_silently().await {
                    break;
                }
            }
        }
    }
    debug!(view = %list.view_id(), "Laço de atualização encerrado");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::testing::{batch, pending, ScriptedApi};
    use emergency_core::RequestFeed;

    const INTERVAL: Duration = Duration::from_secs(15);

    struct Harness {
        api: Arc<ScriptedApi>,
        notifier: Arc<RecordingNotifier>,
        polling: Arc<LivePollingController>,
    }

    fn harness() -> Harness {
        let api = Arc::new(ScriptedApi::with_records(vec![pending("r1")]));
        let notifier = Arc::new(RecordingNotifier::default());
        let list = Arc::new(RequestListController::new(
            RequestFeed::Live,
            api.clone(),
            notifier.clone(),
        ));
        Harness {
            api,
            notifier,
            polling: Arc::new(LivePollingController::new(list, INTERVAL)),
        }
    }

    async fn advance(duration: Duration) {
        tokio::time::sleep(duration).await;
        settle().await;
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_loads_then_polls_every_interval() {
        let h = harness();

        let collection = h.polling.activate().await.unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(h.api.fetches(), 1);
        assert!(h.polling.is_running());

        advance(Duration::from_millis(14_000)).await;
        assert_eq!(h.api.fetches(), 1);

        advance(Duration::from_millis(1_500)).await;
        assert_eq!(h.api.fetches(), 2);

        advance(INTERVAL).await;
        assert_eq!(h.api.fetches(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_ticks_are_silent_and_keep_polling() {
        let h = harness();
        h.polling.activate().await.unwrap();
        h.api.set_failing(true);

        advance(Duration::from_millis(15_500)).await;
        advance(INTERVAL).await;

        assert_eq!(h.api.fetches(), 3);
        assert!(h.notifier.errors().is_empty());
        assert!(h.polling.is_running());
        // A coleção anterior continua exibida
        assert_eq!(h.polling.list().snapshot().collection.len(), 1);
        assert!(h.polling.list().snapshot().error.is_some());

        h.api.set_failing(false);
        advance(INTERVAL).await;
        assert!(h.polling.list().snapshot().error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_failure_notifies_and_still_schedules() {
        let h = harness();
        h.api.set_failing(true);

        assert!(h.polling.activate().await.is_err());
        assert_eq!(h.notifier.errors().len(), 1);
        assert_eq!(h.polling.state(), PollState::Running);

        h.api.set_failing(false);
        advance(Duration::from_millis(15_500)).await;
        assert_eq!(h.api.fetches(), 2);
        assert_eq!(h.polling.list().collection().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_and_halts_polling() {
        let h = harness();
        h.polling.activate().await.unwrap();

        assert!(h.polling.stop());
        assert!(!h.polling.stop());
        assert_eq!(h.polling.state(), PollState::Stopped);

        advance(Duration::from_secs(60)).await;
        assert_eq!(h.api.fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_becoming_visible_refreshes_immediately() {
        let h = harness();
        h.polling.activate().await.unwrap();

        h.polling.set_visible(false);
        advance(Duration::from_secs(45)).await;
        assert_eq!(h.api.fetches(), 1);

        h.polling.set_visible(true);
        settle().await;
        assert_eq!(h.api.fetches(), 2);

        // Visível de novo enquanto roda: nada muda
        h.polling.set_visible(true);
        settle().await;
        assert_eq!(h.api.fetches(), 2);

        advance(Duration::from_millis(15_500)).await;
        assert_eq!(h.api.fetches(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_during_initial_load_stays_stopped() {
        let h = harness();
        let reply = h.api.hold_next_fetch();
        let activation = tokio::spawn({
            let polling = Arc::clone(&h.polling);
            async move { polling.activate().await }
        });
        settle().await;
        assert_eq!(h.api.fetches(), 1);

        h.polling.set_visible(false);
        reply.send(Ok(batch(vec![pending("r1")]))).unwrap();
        activation.await.unwrap().unwrap();

        assert_eq!(h.polling.state(), PollState::Stopped);
        advance(Duration::from_secs(46)).await;
        assert_eq!(h.api.fetches(), 1);

        h.polling.set_visible(true);
        settle().await;
        assert_eq!(h.api.fetches(), 2);
        assert!(h.polling.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shown_during_initial_load_waits_for_activation() {
        let h = harness();
        let reply = h.api.hold_next_fetch();
        let activation = tokio::spawn({
            let polling = Arc::clone(&h.polling);
            async move { polling.activate().await }
        });
        settle().await;

        h.polling.set_visible(false);
        h.polling.set_visible(true);
        settle().await;
        assert_eq!(h.api.fetches(), 1);
        assert_eq!(h.polling.state(), PollState::Stopped);

        reply.send(Ok(batch(vec![pending("r1")]))).unwrap();
        activation.await.unwrap().unwrap();
        assert!(h.polling.is_running());
        assert_eq!(h.api.fetches(), 1);

        advance(Duration::from_millis(15_500)).await;
        assert_eq!(h.api.fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_stops_and_closes_view() {
        let h = harness();
        h.polling.activate().await.unwrap();

        h.polling.teardown();
        advance(Duration::from_secs(60)).await;

        assert_eq!(h.api.fetches(), 1);
        assert!(h.polling.list().is_closed());
        assert!(!h.polling.start());
        assert_eq!(h.polling.activate().await, Err(FetchError::ViewClosed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_timer() {
        let h = harness();
        h.polling.activate().await.unwrap();
        let list = Arc::clone(h.polling.list());

        drop(h.polling);
        advance(Duration::from_secs(60)).await;

        assert_eq!(h.api.fetches(), 1);
        assert_eq!(Arc::strong_count(&list), 1);
    }
}
