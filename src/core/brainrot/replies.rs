// Chat replies.
//
// Every game outcome, rule violations included, ends up as one of these
// strings. The caller is a chat bot that prints them verbatim.

use super::catalog::CatalogItem;
use super::inventory::InventoryView;
use chrono::{DateTime, Duration, Utc};

pub const HELP: &str = "Comandos de brainrot: !brainrot farmear | !brainrot inventario | \
!brainrot robar [usuario] | !brainrot remplazo <número> | !brainrot descartar <número>";

/// Render a wait as `1h 5m`, `12m 3s` or `40s`, rounding up to the second.
pub fn format_wait(wait: Duration) -> String {
    let total = ((wait.num_milliseconds() + 999) / 1000).max(1);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn describe(item: &CatalogItem) -> String {
    format!("{} ({})", item.name, item.rarity)
}

pub fn help() -> String {
    HELP.to_string()
}

pub fn farm_cooldown(username: &str, wait: Duration) -> String {
    format!(
        "{}, todavía estás cansado de farmear. Vuelve en {}.",
        username,
        format_wait(wait)
    )
}

pub fn nothing_to_farm() -> String {
    "No hay brainrots para farmear.".to_string()
}

pub fn farmed(username: &str, item: &CatalogItem) -> String {
    format!("{} ha farmeado un: {}!", username, describe(item))
}

pub fn farmed_overflow(
    username: &str,
    item: &CatalogItem,
    capacity: usize,
    timeout: Duration,
) -> String {
    format!(
        "{} ha farmeado un: {}, pero su inventario está lleno ({}/{}). Tienes {} para usar \
         !brainrot remplazo <número> o se perderá.",
        username,
        describe(item),
        capacity,
        capacity,
        format_wait(timeout)
    )
}

pub fn steal_cooldown(username: &str, wait: Duration) -> String {
    format!(
        "{}, la policía te está vigilando. Podrás volver a robar en {}.",
        username,
        format_wait(wait)
    )
}

pub fn self_steal(username: &str) -> String {
    format!(
        "{} intentó robarse a sí mismo y solo consiguió perder su dignidad.",
        username
    )
}

pub fn no_victims(username: &str) -> String {
    format!(
        "{} salió a robar, pero nadie tiene brainrots. No hay víctimas.",
        username
    )
}

pub fn victim_is_broke(thief: &str, victim: &str) -> String {
    format!(
        "{} no tiene brainrots. {} intentó robarle a un pobre.",
        victim.to_uppercase(),
        thief
    )
}

pub fn steal_failed(thief: &str, victim: &str) -> String {
    format!(
        "¡Robo fallido! {} se dio cuenta y aseguró sus memes. {} huye con las manos vacías.",
        victim, thief
    )
}

pub fn steal_succeeded(thief: &str, victim: &str, item: &CatalogItem) -> String {
    format!(
        "¡ROBO EXITOSO! {} le ha robado un [{}] a {}!",
        thief,
        describe(item),
        victim
    )
}

pub fn steal_succeeded_overflow(
    thief: &str,
    victim: &str,
    item: &CatalogItem,
    timeout: Duration,
) -> String {
    format!(
        "¡ROBO EXITOSO! {} le ha robado un [{}] a {}, pero no le cabe en el inventario. \
         Tiene {} para usar !brainrot remplazo <número>.",
        thief,
        describe(item),
        victim,
        format_wait(timeout)
    )
}

pub fn empty_inventory(username: &str, capacity: usize) -> String {
    format!("El inventario de {} está vacío (0/{}).", username, capacity)
}

fn pending_note(view: &InventoryView, now: DateTime<Utc>, timeout: Duration) -> Option<String> {
    let pending = view.pending.as_ref()?;
    let left = pending
        .expires_at(timeout)
        .map(|deadline| deadline - now)
        .unwrap_or(timeout);
    Some(format!(
        "Pendiente: {}, expira en {}",
        describe(&pending.item),
        format_wait(left)
    ))
}

fn numbered(view: &InventoryView) -> String {
    view.permanent
        .iter()
        .enumerate()
        .map(|(i, slot)| format!("{}. {}", i + 1, describe(&slot.item)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn inventory(
    username: &str,
    view: &InventoryView,
    capacity: usize,
    now: DateTime<Utc>,
    timeout: Duration,
) -> String {
    let listing = if view.permanent.is_empty() {
        "vacío".to_string()
    } else {
        numbered(view)
    };

    let mut text = format!(
        "Inventario de {} ({}/{}): {}",
        username,
        view.permanent.len(),
        capacity,
        listing
    );
    if let Some(note) = pending_note(view, now, timeout) {
        text.push_str(" | ");
        text.push_str(&note);
    }
    text
}

pub fn discard_hint(username: &str, view: &InventoryView) -> String {
    if view.permanent.is_empty() {
        return format!("{} no tiene brainrots para descartar.", username);
    }
    format!(
        "Usa !brainrot descartar <número>. Tus brainrots: {}",
        numbered(view)
    )
}

pub fn discarded(username: &str, item: &CatalogItem) -> String {
    format!("{} ha descartado su {}.", username, describe(item))
}

pub fn nothing_to_replace(username: &str) -> String {
    format!(
        "{} no tiene ningún brainrot pendiente para reemplazar.",
        username
    )
}

pub fn replace_hint(username: &str, view: &InventoryView) -> String {
    format!(
        "{}, indica qué brainrot quieres reemplazar con !brainrot remplazo <número>. Tus brainrots: {}",
        username,
        numbered(view)
    )
}

pub fn replaced(username: &str, old: &CatalogItem, new: &CatalogItem) -> String {
    format!(
        "{} ha tirado su {} y se ha quedado con {}.",
        username,
        describe(old),
        describe(new)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_wait() {
        assert_eq!(format_wait(Duration::minutes(10)), "10m 0s");
        assert_eq!(format_wait(Duration::seconds(3599)), "59m 59s");
        assert_eq!(format_wait(Duration::hours(1)), "1h 0m");
        assert_eq!(format_wait(Duration::milliseconds(1500)), "2s");
        assert_eq!(format_wait(Duration::zero()), "1s");
    }
}
