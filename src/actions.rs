use crate::api::AuthSession;
use crate::live_query::LiveQueryClient;
use crate::pages::{PageAction, PagesRouter, Route};

pub struct ActionContext<'a> {
    pub pages_router: &'a mut PagesRouter,
    pub live_query: &'a LiveQueryClient,
    pub auth: &'a AuthSession,
}

pub fn handle_action(ctx: &mut ActionContext<'_>, action: PageAction) {
    match action {
        PageAction::Navigate(page) => handle_navigate(ctx, page),
        PageAction::Logout => handle_logout(ctx),
    }
}

fn handle_navigate(ctx: &mut ActionContext<'_>, page: Route) {
    if page != Route::Login && !ctx.auth.is_authenticated() {
        log::debug!("not signed in, redirecting {page:?} to login");
        ctx.pages_router.navigate(Route::Login);
        return;
    }
    ctx.pages_router.navigate(page);
}

fn handle_logout(ctx: &mut ActionContext<'_>) {
    log::info!("logging out");
    ctx.auth.clear();
    ctx.live_query.clear();
    ctx.pages_router.navigate(Route::Login);
}
