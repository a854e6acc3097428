//! Diesel schema for audit log persistence.

diesel::table! {
    /// Append-only audit records.
    logs (id) {
        /// Record identifier.
        id -> Uuid,
        /// Write timestamp.
        recorded_at -> Timestamptz,
        /// Severity label.
        #[max_length = 20]
        level -> Varchar,
        /// Taxonomy label.
        #[max_length = 20]
        category -> Varchar,
        /// Acting user, cleared when the user is deleted.
        actor_id -> Nullable<Uuid>,
        /// Request origin address.
        #[max_length = 45]
        origin -> Nullable<Varchar>,
        /// Short action label.
        #[max_length = 100]
        action -> Varchar,
        /// Free-text details.
        details -> Text,
    }
}
