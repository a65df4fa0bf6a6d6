use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::session::{Session, SessionStore};

/// Route classification, not session state. Everything under the dashboard
/// prefix is protected; the rest of the application is public.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

pub const PROTECTED_PREFIX: &str = "/dashboard";
pub const PUBLIC_ROOT: &str = "/";
pub const PROTECTED_ROOT: &str = "/dashboard";

pub fn classify(path: &str) -> RouteClass {
    if path.starts_with(PROTECTED_PREFIX) {
        RouteClass::Protected
    } else {
        RouteClass::Public
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Stay,
    ToPublicRoot,
    ToProtectedRoot,
}

/// The transition function. Pure; evaluated on every route change and every
/// session mutation.
pub fn reconcile(has_token: bool, route: RouteClass) -> GuardDecision {
    match (has_token, route) {
        (false, RouteClass::Protected) => GuardDecision::ToPublicRoot,
        (true, RouteClass::Public) => GuardDecision::ToProtectedRoot,
        _ => GuardDecision::Stay,
    }
}

/// Router seam: the guard decides, the router moves.
pub trait Navigate: Send + Sync {
    fn redirect(&self, to: &str);
}

/// Window within which a burst of session/route notifications collapses
/// into a single evaluation.
const DEBOUNCE: Duration = Duration::from_millis(25);

/// The one authoritative navigation guard. Mounted once at the application
/// root; it subscribes to the session and route channels, coalesces bursts,
/// and never re-issues a redirect for a pair it has already applied. The
/// driving task is aborted when the guard is dropped, so a pending redirect
/// dies with its owner.
pub struct NavGuard {
    handle: JoinHandle<()>,
}

impl NavGuard {
    pub fn mount(
        mut session: watch::Receiver<Session>,
        mut route: watch::Receiver<String>,
        nav: Arc<dyn Navigate>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut last_applied: Option<(bool, RouteClass)> = None;

            // Reconcile the state present at mount before waiting for
            // changes; a stale token and a protected URL can coexist at
            // startup.
            Self::evaluate(&mut session, &mut route, &nav, &mut last_applied);

            loop {
                tokio::select! {
                    changed = session.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = route.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
                // Let the rest of the burst land, then evaluate once.
                tokio::time::sleep(DEBOUNCE).await;
                Self::evaluate(&mut session, &mut route, &nav, &mut last_applied);
            }
        });
        Self { handle }
    }

    fn evaluate(
        session: &mut watch::Receiver<Session>,
        route: &mut watch::Receiver<String>,
        nav: &Arc<dyn Navigate>,
        last_applied: &mut Option<(bool, RouteClass)>,
    ) {
        let has_token = session.borrow_and_update().authenticated();
        let path = route.borrow_and_update().clone();
        let pair = (has_token, classify(&path));

        // Idempotence: a pair we already acted on never redirects again,
        // which is what keeps two evaluations from ping-ponging.
        if *last_applied == Some(pair) {
            return;
        }
        *last_applied = Some(pair);

        match reconcile(pair.0, pair.1) {
            GuardDecision::Stay => debug!(%path, has_token, "route stable"),
            GuardDecision::ToPublicRoot => {
                info!(%path, "no token on protected route, redirecting");
                nav.redirect(PUBLIC_ROOT);
            }
            GuardDecision::ToProtectedRoot => {
                info!(%path, "token present on public route, redirecting");
                nav.redirect(PROTECTED_ROOT);
            }
        }
    }
}

impl Drop for NavGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Subtree-local guard. Strictly a passive observer of the same session
/// channel: it answers whether a protected subtree may render while the
/// authoritative guard is redirecting, and never navigates itself.
pub struct RenderGate {
    session: watch::Receiver<Session>,
}

impl RenderGate {
    pub fn new(session: watch::Receiver<Session>) -> Self {
        Self { session }
    }

    pub fn may_render(&self, route: RouteClass) -> bool {
        match route {
            RouteClass::Public => true,
            RouteClass::Protected => self.session.borrow().authenticated(),
        }
    }
}

/// Collaborator asked whether the user really wants to leave the protected
/// area.
pub trait ConfirmExit: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

const EXIT_PROMPT: &str = "You are leaving the dashboard. Do you want to logout?";

/// Exit-confirmation extension of the guard. Intercepts a Protected→Public
/// transition before the router commits it. On confirmation the session is
/// cleared *before* navigation proceeds, so the authoritative guard sees an
/// unauthenticated session on a public route and stays put; the reverse
/// order would re-trigger it against a state that still looks protected.
pub struct ExitGuard {
    store: Arc<SessionStore>,
    confirm: Arc<dyn ConfirmExit>,
    nav: Arc<dyn Navigate>,
}

impl ExitGuard {
    pub fn new(
        store: Arc<SessionStore>,
        confirm: Arc<dyn ConfirmExit>,
        nav: Arc<dyn Navigate>,
    ) -> Self {
        Self {
            store,
            confirm,
            nav,
        }
    }

    /// Returns whether the navigation from `from` to `to` may proceed.
    pub async fn before_navigate(&self, from: &str, to: &str) -> anyhow::Result<bool> {
        let leaving = classify(from) == RouteClass::Protected && classify(to) == RouteClass::Public;
        if !leaving || !self.store.current().authenticated() {
            return Ok(true);
        }

        if self.confirm.confirm(EXIT_PROMPT) {
            // Clear first; only then may the caller navigate.
            self.store.clear().await?;
            info!(%from, %to, "dashboard exit confirmed, session cleared");
            Ok(true)
        } else {
            self.nav.redirect(from);
            debug!(%from, "dashboard exit declined");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::session::MemoryTokenStorage;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNav {
        redirects: Mutex<Vec<String>>,
    }

    impl RecordingNav {
        fn all(&self) -> Vec<String> {
            self.redirects.lock().unwrap().clone()
        }
    }

    impl Navigate for RecordingNav {
        fn redirect(&self, to: &str) {
            self.redirects.lock().unwrap().push(to.to_string());
        }
    }

    fn session_channel(token: Option<&str>) -> (watch::Sender<Session>, watch::Receiver<Session>) {
        watch::channel(Session::new(token.map(str::to_string)))
    }

    /// Long enough for the debounce window to elapse; tests run with paused
    /// time, so this is instant.
    async fn settle() {
        tokio::time::sleep(DEBOUNCE * 4).await;
    }

    #[test]
    fn reconcile_truth_table() {
        assert_eq!(
            reconcile(false, RouteClass::Protected),
            GuardDecision::ToPublicRoot
        );
        assert_eq!(
            reconcile(true, RouteClass::Public),
            GuardDecision::ToProtectedRoot
        );
        assert_eq!(reconcile(true, RouteClass::Protected), GuardDecision::Stay);
        assert_eq!(reconcile(false, RouteClass::Public), GuardDecision::Stay);
    }

    #[test]
    fn classify_by_prefix() {
        assert_eq!(classify("/"), RouteClass::Public);
        assert_eq!(classify("/about"), RouteClass::Public);
        assert_eq!(classify("/dashboard"), RouteClass::Protected);
        assert_eq!(classify("/dashboard/myblogs"), RouteClass::Protected);
    }

    #[tokio::test(start_paused = true)]
    async fn mount_redirects_tokenless_protected_route_once() {
        let (_session_tx, session_rx) = session_channel(None);
        let (_route_tx, route_rx) = watch::channel("/dashboard/myblogs".to_string());
        let nav = Arc::new(RecordingNav::default());

        let _guard = NavGuard::mount(session_rx, route_rx, nav.clone());
        settle().await;

        assert_eq!(nav.all(), vec![PUBLIC_ROOT.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn stable_pair_never_redirects_twice() {
        let (session_tx, session_rx) = session_channel(None);
        let (route_tx, route_rx) = watch::channel("/dashboard".to_string());
        let nav = Arc::new(RecordingNav::default());

        let _guard = NavGuard::mount(session_rx, route_rx, nav.clone());
        settle().await;

        // Re-notify the identical state many times on both channels; the
        // pair is stable, so across the whole sequence at most one redirect
        // may fire.
        for i in 0..10 {
            if i % 2 == 0 {
                session_tx.send_replace(Session::default());
            } else {
                route_tx.send_replace("/dashboard".to_string());
            }
            settle().await;
        }

        assert_eq!(nav.all().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_session_mutations_redirects_once() {
        let (session_tx, session_rx) = session_channel(None);
        let (_route_tx, route_rx) = watch::channel("/".to_string());
        let nav = Arc::new(RecordingNav::default());

        let _guard = NavGuard::mount(session_rx, route_rx, nav.clone());
        settle().await;
        assert!(nav.all().is_empty());

        // login, logout, login again inside one debounce window
        session_tx.send_replace(Session::new(Some("t1".into())));
        session_tx.send_replace(Session::default());
        session_tx.send_replace(Session::new(Some("t2".into())));
        settle().await;

        assert_eq!(nav.all(), vec![PROTECTED_ROOT.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn logout_on_protected_route_redirects_to_public_root() {
        let (session_tx, session_rx) = session_channel(Some("t1"));
        let (_route_tx, route_rx) = watch::channel("/dashboard".to_string());
        let nav = Arc::new(RecordingNav::default());

        let _guard = NavGuard::mount(session_rx, route_rx, nav.clone());
        settle().await;
        assert!(nav.all().is_empty());

        session_tx.send_replace(Session::default());
        settle().await;

        assert_eq!(nav.all(), vec![PUBLIC_ROOT.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_guard_never_redirects() {
        let (session_tx, session_rx) = session_channel(Some("t1"));
        let (route_tx, route_rx) = watch::channel("/dashboard".to_string());
        let nav = Arc::new(RecordingNav::default());

        let guard = NavGuard::mount(session_rx, route_rx, nav.clone());
        settle().await;
        assert!(nav.all().is_empty());

        // A mutation lands right before teardown; the pending evaluation
        // must die with the guard.
        session_tx.send_replace(Session::default());
        drop(guard);
        settle().await;

        route_tx.send_replace("/dashboard/profile".to_string());
        settle().await;

        assert!(nav.all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn render_gate_observes_without_navigating() {
        let (session_tx, session_rx) = session_channel(None);
        let gate = RenderGate::new(session_rx);

        assert!(gate.may_render(RouteClass::Public));
        assert!(!gate.may_render(RouteClass::Protected));

        session_tx.send_replace(Session::new(Some("t1".into())));
        assert!(gate.may_render(RouteClass::Protected));
    }

    struct FixedConfirm(bool);
    impl ConfirmExit for FixedConfirm {
        fn confirm(&self, _message: &str) -> bool {
            self.0
        }
    }

    async fn logged_in_store() -> Arc<SessionStore> {
        let store = SessionStore::open(Arc::new(MemoryTokenStorage::default()))
            .await
            .expect("open");
        store.set_token("t1").await.expect("set");
        Arc::new(store)
    }

    #[tokio::test]
    async fn exit_confirmed_clears_session_before_navigation_proceeds() {
        let store = logged_in_store().await;
        let nav = Arc::new(RecordingNav::default());
        let guard = ExitGuard::new(store.clone(), Arc::new(FixedConfirm(true)), nav.clone());

        let proceed = guard
            .before_navigate("/dashboard", "/")
            .await
            .expect("before_navigate");

        // By the time the caller is allowed to navigate, the session is
        // already unauthenticated.
        assert!(proceed);
        assert!(!store.current().authenticated());
        assert!(nav.all().is_empty());
    }

    #[tokio::test]
    async fn exit_declined_navigates_back_and_keeps_session() {
        let store = logged_in_store().await;
        let nav = Arc::new(RecordingNav::default());
        let guard = ExitGuard::new(store.clone(), Arc::new(FixedConfirm(false)), nav.clone());

        let proceed = guard
            .before_navigate("/dashboard/myblogs", "/")
            .await
            .expect("before_navigate");

        assert!(!proceed);
        assert!(store.current().authenticated());
        assert_eq!(nav.all(), vec!["/dashboard/myblogs".to_string()]);
    }

    #[tokio::test]
    async fn exit_guard_ignores_public_to_public_moves() {
        let store = logged_in_store().await;
        let nav = Arc::new(RecordingNav::default());
        let guard = ExitGuard::new(store.clone(), Arc::new(FixedConfirm(false)), nav.clone());

        assert!(guard.before_navigate("/", "/about").await.expect("ok"));
        assert!(guard
            .before_navigate("/dashboard", "/dashboard/profile")
            .await
            .expect("ok"));
        assert!(store.current().authenticated());
        assert!(nav.all().is_empty());
    }
}
