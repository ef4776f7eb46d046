//! The session controller: owns filter, board, and selection state, and
//! orchestrates refresh, detail lookup, direction switching, and recovery
//! from transient fetch failures.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::ldb::{failure_message, LdbApi, LdbError};
use crate::stations::{StationCode, StationDirectory};

use super::models::{Board, Filter, ServiceDetail, ServiceId};
use super::scheduler::RefreshScheduler;

/// User intents emitted by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Replace the filter with a new origin/destination pair.
    SelectStation {
        /// Origin station code; must resolve in the directory.
        from: StationCode,
        /// Destination code, or `None` for all destinations.
        to: Option<StationCode>,
    },
    /// A board row was selected.
    SelectRow(usize),
    /// Explicit refresh request (hotkey, menu, startup).
    RequestRefresh,
    /// Swap origin and destination.
    RequestSwitch,
    /// Drop the destination filter.
    RequestAllDestinations,
}

/// Render instructions consumed by the presentation layer, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderUpdate {
    /// Replace the window title.
    SetTitle(String),
    /// Replace the departure rows.
    SetBoardRows(Vec<String>),
    /// Replace the calling-point rows.
    SetDetailRows(Vec<String>),
    /// Replace the messages panel content.
    SetMessages(Vec<String>),
    /// Enable or disable the filter-dependent menu actions.
    SetMenuEnablement {
        /// Whether "switch direction" is available.
        switch: bool,
        /// Whether "all destinations" is available.
        all_destinations: bool,
    },
}

/// Completion and timing events feeding back into the controller.
#[derive(Debug)]
pub enum SessionEvent {
    /// The periodic ticker says it is time to refresh.
    RefreshDue,
    /// A board fetch finished.
    BoardLoaded {
        /// Token issued when the fetch was requested.
        seq: u64,
        /// Outcome of the fetch.
        result: Result<Board, LdbError>,
    },
    /// A detail fetch finished.
    DetailLoaded {
        /// Token issued when the fetch was requested.
        seq: u64,
        /// Outcome of the fetch.
        result: Result<ServiceDetail, LdbError>,
    },
}

/// Board lifecycle phase. A failed fetch is a transient message, not a
/// phase: the controller falls back to `Loaded` or `Idle` depending on
/// whether a board is still displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardPhase {
    /// No board has been loaded for the current filter yet.
    #[default]
    Idle,
    /// A board fetch is outstanding.
    Loading,
    /// A board is displayed.
    Loaded,
}

/// The session core. Consumes [`Intent`]s and [`SessionEvent`]s, returns
/// ordered [`RenderUpdate`]s, and spawns network fetches whose completions
/// come back through the event channel given at construction.
pub struct SessionController<C> {
    directory: Arc<StationDirectory>,
    client: C,
    events: mpsc::Sender<SessionEvent>,
    filter: Option<Filter>,
    board: Option<Board>,
    service_ids: Vec<ServiceId>,
    scheduler: RefreshScheduler,
    detail_seq: u64,
    phase: BoardPhase,
}

impl<C: LdbApi> SessionController<C> {
    /// Create a controller with no filter and no board.
    pub fn new(
        directory: Arc<StationDirectory>,
        client: C,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            directory,
            client,
            events,
            filter: None,
            board: None,
            service_ids: Vec::new(),
            scheduler: RefreshScheduler::new(),
            detail_seq: 0,
            phase: BoardPhase::Idle,
        }
    }

    /// The current filter, if a search has been made.
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// The most recently applied board.
    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    /// Current board lifecycle phase.
    pub fn phase(&self) -> BoardPhase {
        self.phase
    }

    /// Title for the current board, or the default before the first load.
    pub fn title(&self) -> String {
        self.board
            .as_ref()
            .map(Board::title)
            .unwrap_or_else(|| "Departures".to_string())
    }

    /// Whether "switch direction" is currently meaningful.
    pub fn switch_enabled(&self) -> bool {
        self.filter.as_ref().is_some_and(|f| f.to.is_some())
    }

    /// Whether "all destinations" is currently meaningful.
    pub fn all_destinations_enabled(&self) -> bool {
        self.switch_enabled()
    }

    /// Apply a user intent.
    pub fn handle_intent(&mut self, intent: Intent) -> Vec<RenderUpdate> {
        match intent {
            Intent::SelectStation { from, to } => self.select_station(from, to),
            Intent::SelectRow(index) => self.start_detail_fetch(index),
            Intent::RequestRefresh => self.start_refresh(),
            Intent::RequestSwitch => self.switch_direction(),
            Intent::RequestAllDestinations => self.all_destinations(),
        }
    }

    /// Apply a timer or completion event.
    pub fn handle_event(&mut self, event: SessionEvent) -> Vec<RenderUpdate> {
        match event {
            SessionEvent::RefreshDue => self.start_refresh(),
            SessionEvent::BoardLoaded { seq, result } => self.apply_board(seq, result),
            SessionEvent::DetailLoaded { seq, result } => self.apply_detail(seq, result),
        }
    }

    fn select_station(&mut self, from: StationCode, to: Option<StationCode>) -> Vec<RenderUpdate> {
        if !self.directory.contains(&from) {
            return vec![RenderUpdate::SetMessages(vec![format!(
                "Unknown station code: {from}"
            )])];
        }
        if let Some(to) = &to {
            if !self.directory.contains(to) {
                return vec![RenderUpdate::SetMessages(vec![format!(
                    "Unknown station code: {to}"
                )])];
            }
        }

        info!(%from, to = to.as_ref().map(|c| c.as_str()), "filter replaced");
        self.filter = Some(Filter::new(from, to));
        let mut updates = vec![self.enablement_update()];
        updates.extend(self.start_refresh());
        updates
    }

    fn switch_direction(&mut self) -> Vec<RenderUpdate> {
        let Some(filter) = self.filter.as_mut() else {
            return Vec::new();
        };
        if !filter.switch() {
            return Vec::new();
        }

        info!(from = %filter.from, "direction switched");
        let mut updates = vec![self.enablement_update()];
        updates.extend(self.start_refresh());
        updates
    }

    fn all_destinations(&mut self) -> Vec<RenderUpdate> {
        let Some(filter) = self.filter.as_mut() else {
            return Vec::new();
        };

        filter.to = None;
        let mut updates = vec![self.enablement_update()];
        updates.extend(self.start_refresh());
        updates
    }

    /// Request the current filter's board. Detail rows and messages are
    /// cleared up front so stale details are never shown against a new
    /// board; the board rows and id list stay until a replacement arrives.
    fn start_refresh(&mut self) -> Vec<RenderUpdate> {
        let Some(filter) = self.filter.clone() else {
            return Vec::new();
        };

        let seq = self.scheduler.issue();
        self.phase = BoardPhase::Loading;
        debug!(seq, "board refresh issued");

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client.fetch_board(&filter).await;
            let _ = events.send(SessionEvent::BoardLoaded { seq, result }).await;
        });

        vec![
            RenderUpdate::SetDetailRows(Vec::new()),
            RenderUpdate::SetMessages(Vec::new()),
        ]
    }

    /// Positional detail lookup. Out-of-range indexes and selections made
    /// before the first board are silent no-ops.
    fn start_detail_fetch(&mut self, index: usize) -> Vec<RenderUpdate> {
        let Some(id) = self.service_ids.get(index).cloned() else {
            return Vec::new();
        };

        self.detail_seq += 1;
        let seq = self.detail_seq;
        debug!(seq, %id, index, "detail fetch issued");

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client.fetch_service_detail(&id).await;
            let _ = events
                .send(SessionEvent::DetailLoaded { seq, result })
                .await;
        });

        Vec::new()
    }

    fn apply_board(&mut self, seq: u64, result: Result<Board, LdbError>) -> Vec<RenderUpdate> {
        if !self.scheduler.is_current(seq) {
            debug!(seq, "superseded board completion discarded");
            return Vec::new();
        }

        match result {
            Ok(board) => {
                info!(rows = board.services.len(), title = %board.title(), "board replaced");
                self.phase = BoardPhase::Loaded;
                self.service_ids = board.service_ids();

                let mut updates = vec![
                    RenderUpdate::SetTitle(board.title()),
                    RenderUpdate::SetBoardRows(board.rows()),
                    RenderUpdate::SetMessages(board.messages.clone()),
                    self.enablement_update(),
                ];
                self.board = Some(board);
                updates.extend(self.start_detail_fetch(0));
                updates
            }
            Err(err) => {
                warn!(%err, "board refresh failed");
                self.phase = if self.board.is_some() {
                    BoardPhase::Loaded
                } else {
                    BoardPhase::Idle
                };
                vec![RenderUpdate::SetMessages(vec![failure_message(
                    "Board refresh failed",
                    &err,
                )])]
            }
        }
    }

    fn apply_detail(
        &mut self,
        seq: u64,
        result: Result<ServiceDetail, LdbError>,
    ) -> Vec<RenderUpdate> {
        if seq != self.detail_seq {
            debug!(seq, "superseded detail completion discarded");
            return Vec::new();
        }

        match result {
            Ok(detail) => vec![RenderUpdate::SetDetailRows(detail.rows())],
            Err(err) => {
                warn!(%err, "detail fetch failed");
                vec![RenderUpdate::SetMessages(vec![failure_message(
                    "Service details unavailable",
                    &err,
                )])]
            }
        }
    }

    fn enablement_update(&self) -> RenderUpdate {
        RenderUpdate::SetMenuEnablement {
            switch: self.switch_enabled(),
            all_destinations: self.all_destinations_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ldb::MockLdbClient;

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    fn directory() -> Arc<StationDirectory> {
        Arc::new(StationDirectory::parse("Lewisham,LEW\nCharing Cross,CHX\n").unwrap())
    }

    fn controller() -> (
        SessionController<MockLdbClient>,
        mpsc::Receiver<SessionEvent>,
        MockLdbClient,
    ) {
        let directory = directory();
        let client = MockLdbClient::new(directory.clone());
        let (tx, rx) = mpsc::channel(16);
        (
            SessionController::new(directory, client.clone(), tx),
            rx,
            client,
        )
    }

    fn select_lew_chx(session: &mut SessionController<MockLdbClient>) -> Vec<RenderUpdate> {
        session.handle_intent(Intent::SelectStation {
            from: code("LEW"),
            to: Some(code("CHX")),
        })
    }

    async fn recv_board(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
        loop {
            match rx.recv().await.expect("event channel closed") {
                event @ SessionEvent::BoardLoaded { .. } => return event,
                _ => continue,
            }
        }
    }

    async fn recv_detail(rx: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
        loop {
            match rx.recv().await.expect("event channel closed") {
                event @ SessionEvent::DetailLoaded { .. } => return event,
                _ => continue,
            }
        }
    }

    /// Drive one full refresh: select the filter, apply the completion.
    async fn load_board(
        session: &mut SessionController<MockLdbClient>,
        rx: &mut mpsc::Receiver<SessionEvent>,
    ) -> Vec<RenderUpdate> {
        select_lew_chx(session);
        let event = recv_board(rx).await;
        session.handle_event(event)
    }

    #[tokio::test]
    async fn select_station_clears_details_and_messages_optimistically() {
        let (mut session, _rx, _client) = controller();
        let updates = select_lew_chx(&mut session);

        assert!(updates.contains(&RenderUpdate::SetDetailRows(Vec::new())));
        assert!(updates.contains(&RenderUpdate::SetMessages(Vec::new())));
        assert!(updates.contains(&RenderUpdate::SetMenuEnablement {
            switch: true,
            all_destinations: true,
        }));
        assert_eq!(session.phase(), BoardPhase::Loading);
    }

    #[tokio::test]
    async fn unknown_station_code_reports_and_leaves_session_untouched() {
        let (mut session, mut rx, _client) = controller();

        let updates = session.handle_intent(Intent::SelectStation {
            from: code("ZZZ"),
            to: None,
        });
        assert_eq!(
            updates,
            vec![RenderUpdate::SetMessages(vec![
                "Unknown station code: ZZZ".to_string()
            ])]
        );
        assert!(session.filter().is_none());
        assert_eq!(session.phase(), BoardPhase::Idle);

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn successful_refresh_replaces_board_and_title() {
        let (mut session, mut rx, _client) = controller();
        let updates = load_board(&mut session, &mut rx).await;

        assert!(updates.contains(&RenderUpdate::SetTitle(
            "Lewisham to Charing Cross".to_string()
        )));
        let rows = updates.iter().find_map(|u| match u {
            RenderUpdate::SetBoardRows(rows) => Some(rows.clone()),
            _ => None,
        });
        let rows = rows.expect("board rows update missing");
        assert_eq!(rows.len(), 10);
        for row in &rows {
            let bytes = row.as_bytes();
            assert!(bytes[0].is_ascii_digit() && bytes[1].is_ascii_digit());
            assert_eq!(bytes[2], b':');
            assert!(row.contains("Charing Cross"));
            assert!(row.contains("On time"));
            assert!(row.contains("Southeastern"));
        }
        assert_eq!(session.phase(), BoardPhase::Loaded);
        assert_eq!(session.title(), "Lewisham to Charing Cross");
    }

    #[tokio::test]
    async fn board_success_selects_row_zero_for_details() {
        let (mut session, mut rx, _client) = controller();
        load_board(&mut session, &mut rx).await;

        // Applying the board kicked off a detail fetch for row 0.
        let event = recv_detail(&mut rx).await;
        let updates = session.handle_event(event);
        let rows = updates.iter().find_map(|u| match u {
            RenderUpdate::SetDetailRows(rows) => Some(rows.clone()),
            _ => None,
        });
        assert_eq!(rows.expect("detail rows update missing").len(), 9);
    }

    #[tokio::test]
    async fn selected_row_details_arrive_in_calling_order() {
        let (mut session, mut rx, _client) = controller();
        load_board(&mut session, &mut rx).await;

        let row0 = recv_detail(&mut rx).await;
        session.handle_event(row0);

        session.handle_intent(Intent::SelectRow(2));
        let event = recv_detail(&mut rx).await;
        let updates = session.handle_event(event);
        let rows = updates.iter().find_map(|u| match u {
            RenderUpdate::SetDetailRows(rows) => Some(rows.clone()),
            _ => None,
        });
        let rows = rows.expect("detail rows update missing");
        assert_eq!(rows.len(), 9);
        assert!(rows[0].contains("Lewisham"));
        assert!(rows[5].contains("St Johns"));
        assert!(rows[8].contains("London Cannon Street"));
    }

    #[tokio::test]
    async fn rapid_reselection_applies_only_the_latest_detail() {
        let (mut session, mut rx, _client) = controller();
        load_board(&mut session, &mut rx).await;
        let row0 = recv_detail(&mut rx).await;
        session.handle_event(row0);

        session.handle_intent(Intent::SelectRow(1));
        session.handle_intent(Intent::SelectRow(2));

        let mut completions = Vec::new();
        completions.push(recv_detail(&mut rx).await);
        completions.push(recv_detail(&mut rx).await);
        completions.sort_by_key(|event| match event {
            SessionEvent::DetailLoaded { seq, .. } => *seq,
            _ => unreachable!(),
        });
        let stale = completions.remove(0);
        let current = completions.remove(0);

        let updates = session.handle_event(current);
        assert!(updates
            .iter()
            .any(|u| matches!(u, RenderUpdate::SetDetailRows(_))));

        assert!(session.handle_event(stale).is_empty());
    }

    #[tokio::test]
    async fn select_row_is_noop_before_first_board_and_out_of_range() {
        let (mut session, mut rx, _client) = controller();

        assert!(session.handle_intent(Intent::SelectRow(0)).is_empty());
        assert!(session.handle_intent(Intent::SelectRow(3)).is_empty());

        load_board(&mut session, &mut rx).await;
        assert!(session.handle_intent(Intent::SelectRow(10)).is_empty());
        assert!(session.handle_intent(Intent::SelectRow(usize::MAX)).is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_retains_board_and_surfaces_one_message() {
        let (mut session, mut rx, client) = controller();
        load_board(&mut session, &mut rx).await;
        let title_before = session.title();
        let rows_before = session.board().unwrap().rows();
        assert_eq!(rows_before.len(), 10);

        client.set_board_failure(true);
        session.handle_intent(Intent::RequestRefresh);
        let event = recv_board(&mut rx).await;
        let updates = session.handle_event(event);

        let messages = updates.iter().find_map(|u| match u {
            RenderUpdate::SetMessages(messages) => Some(messages.clone()),
            _ => None,
        });
        let messages = messages.expect("failure message missing");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Board refresh failed"));

        assert!(!updates
            .iter()
            .any(|u| matches!(u, RenderUpdate::SetBoardRows(_) | RenderUpdate::SetTitle(_))));
        assert_eq!(session.title(), title_before);
        assert_eq!(session.board().unwrap().rows(), rows_before);
        assert_eq!(session.phase(), BoardPhase::Loaded);
    }

    #[tokio::test]
    async fn failed_detail_fetch_retains_rows_and_surfaces_message() {
        let (mut session, mut rx, client) = controller();
        load_board(&mut session, &mut rx).await;
        let row0 = recv_detail(&mut rx).await;
        session.handle_event(row0);

        client.set_detail_failure(true);
        session.handle_intent(Intent::SelectRow(1));
        let event = recv_detail(&mut rx).await;
        let updates = session.handle_event(event);

        assert_eq!(updates.len(), 1);
        let RenderUpdate::SetMessages(messages) = &updates[0] else {
            panic!("expected a messages update, got {updates:?}");
        };
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Service details unavailable"));
    }

    #[tokio::test]
    async fn superseded_board_completion_is_discarded() {
        let (mut session, mut rx, _client) = controller();

        // First search, then a second one before the first completes.
        select_lew_chx(&mut session);
        session.handle_intent(Intent::SelectStation {
            from: code("CHX"),
            to: Some(code("LEW")),
        });

        let mut completions = Vec::new();
        completions.push(recv_board(&mut rx).await);
        completions.push(recv_board(&mut rx).await);
        completions.sort_by_key(|event| match event {
            SessionEvent::BoardLoaded { seq, .. } => *seq,
            _ => unreachable!(),
        });
        let late = completions.remove(0);
        let current = completions.remove(0);

        session.handle_event(current);
        assert_eq!(session.title(), "Charing Cross to Lewisham");

        let updates = session.handle_event(late);
        assert!(updates.is_empty());
        assert_eq!(session.title(), "Charing Cross to Lewisham");
    }

    #[tokio::test]
    async fn superseded_failure_is_also_discarded() {
        let (mut session, mut rx, client) = controller();

        client.set_board_failure(true);
        select_lew_chx(&mut session);
        // Let the first fetch run against the failing client before clearing.
        tokio::task::yield_now().await;
        client.set_board_failure(false);
        session.handle_intent(Intent::RequestRefresh);

        let mut completions = Vec::new();
        completions.push(recv_board(&mut rx).await);
        completions.push(recv_board(&mut rx).await);
        completions.sort_by_key(|event| match event {
            SessionEvent::BoardLoaded { seq, .. } => *seq,
            _ => unreachable!(),
        });
        let failed = completions.remove(0);
        let succeeded = completions.remove(0);

        session.handle_event(succeeded);
        let updates = session.handle_event(failed);
        assert!(updates.is_empty());
        assert_eq!(session.title(), "Lewisham to Charing Cross");
    }

    #[tokio::test]
    async fn switch_swaps_filter_and_is_self_inverse() {
        let (mut session, mut rx, _client) = controller();
        load_board(&mut session, &mut rx).await;

        session.handle_intent(Intent::RequestSwitch);
        assert_eq!(session.filter().unwrap().from, code("CHX"));
        assert_eq!(session.filter().unwrap().to, Some(code("LEW")));

        session.handle_intent(Intent::RequestSwitch);
        assert_eq!(session.filter().unwrap().from, code("LEW"));
        assert_eq!(session.filter().unwrap().to, Some(code("CHX")));
    }

    #[tokio::test]
    async fn switch_is_noop_for_all_destinations() {
        let (mut session, _rx, _client) = controller();
        session.handle_intent(Intent::SelectStation {
            from: code("LEW"),
            to: None,
        });

        let updates = session.handle_intent(Intent::RequestSwitch);
        assert!(updates.is_empty());
        assert_eq!(session.filter().unwrap().to, None);
    }

    #[tokio::test]
    async fn all_destinations_drops_filter_and_disables_actions() {
        let (mut session, mut rx, _client) = controller();
        load_board(&mut session, &mut rx).await;
        assert!(session.switch_enabled());

        let updates = session.handle_intent(Intent::RequestAllDestinations);
        assert!(updates.contains(&RenderUpdate::SetMenuEnablement {
            switch: false,
            all_destinations: false,
        }));
        assert_eq!(session.filter().unwrap().to, None);

        let event = recv_board(&mut rx).await;
        session.handle_event(event);
        assert_eq!(session.title(), "Lewisham to all destinations");
    }

    #[tokio::test]
    async fn refresh_due_without_filter_is_noop() {
        let (mut session, mut rx, _client) = controller();
        assert!(session.handle_event(SessionEvent::RefreshDue).is_empty());

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
