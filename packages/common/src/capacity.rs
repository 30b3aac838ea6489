use crate::RegistrationStatus;

/// Decide the status of a new registration from the event's capacity.
///
/// A registration is confirmed while fewer than `max_participants`
/// registrations hold a confirmed slot, and waitlisted otherwise. A
/// non-positive capacity waitlists everybody.
pub fn status_for_capacity(max_participants: i32, confirmed_count: u64) -> RegistrationStatus {
    match u64::try_from(max_participants) {
        Ok(max) if confirmed_count < max => RegistrationStatus::Confirmed,
        _ => RegistrationStatus::Waitlisted,
    }
}
