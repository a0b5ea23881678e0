use crate::{
    message::view::{NavigationBuffer, ViewAction, ViewCommand, ViewEvent, ViewEventKind, ViewId},
    prelude::*,
    state::binding::RESTORE_SENTINEL,
};
use std::collections::{HashMap, VecDeque};
use tabnav_api::tab::{TabId, TabPage};
use tokio::select;

/// An embedded view without a renderer.
/// Keeps a navigation buffer per view, and answers commands with the events a browser view would emit.
pub struct HeadlessViewService {
    _commands: Lifeline,
}

impl Service for HeadlessViewService {
    type Bus = NavBus;
    type Lifeline = anyhow::Result<Self>;

    fn spawn(bus: &Self::Bus) -> Self::Lifeline {
        let rx = bus.rx::<ViewCommand>()?;
        let tx = bus.tx::<ViewEvent>()?;

        let _commands = Self::try_task("commands", Self::run(rx, tx));

        Ok(Self { _commands })
    }
}

impl HeadlessViewService {
    /// Events are queued locally, so a full event channel never stops the command intake.
    async fn run(
        mut rx: impl Stream<Item = ViewCommand> + Unpin,
        mut tx: impl Sink<Item = ViewEvent> + Unpin,
    ) -> anyhow::Result<()> {
        let mut views = HeadlessViews::default();
        let mut pending = VecDeque::new();

        loop {
            select! {
                command = rx.recv() => {
                    let command = match command {
                        Some(command) => command,
                        None => break,
                    };

                    trace!("ViewCommand: {:?}", &command);
                    pending.extend(views.apply(command));
                },
                sent = send_front(&mut tx, &pending), if !pending.is_empty() => {
                    sent?;
                    pending.pop_front();
                }
            }
        }

        Ok(())
    }
}

/// Sends a copy of the oldest queued event.  The queue is only popped once the send completes.
async fn send_front<S>(tx: &mut S, pending: &VecDeque<ViewEvent>) -> anyhow::Result<()>
where
    S: Sink<Item = ViewEvent> + Unpin,
{
    if let Some(event) = pending.front() {
        tx.send(event.clone())
            .await
            .map_err(|_| anyhow::Error::msg("tx ViewEvent: channel closed"))?;
    }

    Ok(())
}

#[derive(Debug)]
struct HeadlessView {
    tab: TabId,
    buffer: NavigationBuffer,
}

#[derive(Debug, Default)]
struct HeadlessViews {
    views: HashMap<ViewId, HeadlessView>,
}

impl HeadlessViews {
    pub fn apply(&mut self, command: ViewCommand) -> Vec<ViewEvent> {
        let ViewCommand { tab, view, action } = command;

        if let ViewAction::Create { url } = action {
            let buffer = NavigationBuffer::new(vec![TabPage::new(url.as_str())], 0);
            self.views.insert(
                view,
                HeadlessView {
                    tab: tab.clone(),
                    buffer,
                },
            );

            let mut events = self.load(view, false);
            events.push(ViewEvent::new(tab, view, ViewEventKind::DomReady));
            return events;
        }

        let headless = match self.views.get_mut(&view) {
            Some(headless) => headless,
            None => {
                trace!("dropping command for missing {}", view);
                return vec![];
            }
        };

        match action {
            ViewAction::Create { .. } => vec![],
            ViewAction::Replay(buffer) => {
                headless.buffer = buffer;
                self.load(view, false)
            }
            ViewAction::GoToIndex(index) => {
                if index >= headless.buffer.history.len() {
                    return vec![];
                }

                headless.buffer.current_index = index;
                self.load(view, false)
            }
            ViewAction::LoadUrl(url) => {
                let will = ViewEvent::new(
                    headless.tab.clone(),
                    view,
                    ViewEventKind::WillNavigate { url: url.clone() },
                );

                let in_page = headless
                    .buffer
                    .current()
                    .map(|page| same_document(page.url.as_str(), url.as_str()))
                    .unwrap_or(false);

                let buffer = &mut headless.buffer;
                if !buffer.history.is_empty() {
                    buffer.history.truncate(buffer.current_index + 1);
                }
                buffer.history.push(TabPage::new(url));
                buffer.current_index = buffer.history.len() - 1;

                let mut events = vec![will];
                events.extend(self.load(view, in_page));
                events
            }
            ViewAction::ResolvePath => {
                let path = headless
                    .buffer
                    .current()
                    .map(|page| format!("url/{}", page.url))
                    .unwrap_or_default();

                vec![ViewEvent::new(
                    headless.tab.clone(),
                    view,
                    ViewEventKind::PathResolved(path),
                )]
            }
            ViewAction::Destroy => {
                self.views.remove(&view);
                vec![ViewEvent::new(tab, view, ViewEventKind::Destroyed)]
            }
        }
    }

    /// The events for committing the buffer's current page
    fn load(&self, view: ViewId, in_page: bool) -> Vec<ViewEvent> {
        let headless = match self.views.get(&view) {
            Some(headless) => headless,
            None => return vec![],
        };

        let url = match headless.buffer.current() {
            Some(page) => page.url.clone(),
            None => return vec![],
        };

        let buffer = headless.buffer.clone();
        let event = |kind| ViewEvent::new(headless.tab.clone(), view, kind);

        if in_page {
            return vec![event(ViewEventKind::DidNavigateInPage { url, buffer })];
        }

        vec![
            event(ViewEventKind::StartLoading),
            event(ViewEventKind::LoadCommit {
                url: url.clone(),
                main_frame: true,
            }),
            event(ViewEventKind::DidNavigate {
                url: url.clone(),
                buffer,
            }),
            event(ViewEventKind::StopLoading { url }),
        ]
    }
}

/// Whether the urls differ only in their fragment
fn same_document(from: &str, to: &str) -> bool {
    if is_sentinel(from) || !to.contains('#') {
        return false;
    }

    let strip = |url: &str| url.split('#').next().unwrap_or("").to_string();
    strip(from) == strip(to)
}

fn is_sentinel(url: &str) -> bool {
    url.starts_with(RESTORE_SENTINEL)
}
