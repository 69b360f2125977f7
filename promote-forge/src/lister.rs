//! Paginated repository listing.

use promote_core::RepoLocation;

use crate::client::Forge;
use crate::error::ForgeError;

/// Repositories requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Upper bound on pages; a server that ignores `page` would otherwise loop forever.
pub const MAX_PAGES: u32 = 10_000;

/// Names of all repositories in `location`, minus exact matches in `exclude`.
///
/// Pages are requested from 1 upwards until one comes back empty. Any error
/// aborts the listing; there is no retry.
pub fn list_repositories(
    forge: &dyn Forge,
    location: &RepoLocation,
    exclude: &[String],
) -> Result<Vec<String>, ForgeError> {
    let mut names = Vec::new();
    let mut page = 1;
    loop {
        if page > MAX_PAGES {
            return Err(ForgeError::Pagination {
                url: location.to_string(),
                pages: MAX_PAGES,
            });
        }
        let entries = forge.list_repos_page(location, page, PAGE_SIZE)?;
        if entries.is_empty() {
            break;
        }
        tracing::debug!("{location}: page {page} has {} repositories", entries.len());
        names.extend(entries.into_iter().map(|e| e.name));
        page += 1;
    }

    let total = names.len();
    names.retain(|name| !exclude.contains(name));
    tracing::info!(
        "{location}: {} repositories ({} excluded)",
        names.len(),
        total - names.len()
    );
    Ok(names)
}
