//! Diesel schema for task tracking persistence.

diesel::table! {
    /// Tasks.
    tasks (id) {
        id -> Uuid,
        owner_id -> Nullable<Uuid>,
        #[max_length = 255]
        title -> Varchar,
        description -> Nullable<Text>,
        #[max_length = 20]
        status -> Varchar,
        #[max_length = 20]
        priority -> Varchar,
        due_date -> Nullable<Date>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Comments on tasks.
    task_comments (id) {
        id -> Uuid,
        task_id -> Uuid,
        author_id -> Nullable<Uuid>,
        comment -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// File references attached to tasks.
    task_attachments (id) {
        id -> Uuid,
        task_id -> Uuid,
        #[max_length = 255]
        file_name -> Varchar,
        #[max_length = 255]
        file_path -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Named priority labels on tasks.
    task_priorities (id) {
        id -> Uuid,
        task_id -> Uuid,
        #[max_length = 255]
        name -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Schedule and reminder dates for tasks.
    task_schedules (id) {
        id -> Uuid,
        task_id -> Uuid,
        schedule_date -> Nullable<Date>,
        reminder_date -> Nullable<Date>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Recurrence rules for tasks.
    task_recurrences (id) {
        id -> Uuid,
        task_id -> Uuid,
        #[max_length = 20]
        recurrence_type -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Dependency edges between tasks.
    task_dependences (id) {
        id -> Uuid,
        task_id -> Uuid,
        dependent_task_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Change history recorded for task updates.
    task_histories (id) {
        id -> Uuid,
        task_id -> Uuid,
        #[max_length = 255]
        task_name -> Varchar,
        changes -> Text,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Report requests.
    task_reports (id) {
        id -> Uuid,
        user_id -> Nullable<Uuid>,
        #[max_length = 20]
        report_type -> Varchar,
        report_date -> Nullable<Date>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Teams.
    teams (id) {
        id -> Uuid,
        #[max_length = 255]
        name -> Varchar,
        owner_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Team memberships.
    user_teams (id) {
        id -> Uuid,
        user_id -> Uuid,
        team_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user profiles.
    user_profiles (id) {
        id -> Uuid,
        user_id -> Uuid,
        #[max_length = 50]
        role -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(task_comments -> tasks (task_id));
diesel::joinable!(task_attachments -> tasks (task_id));
diesel::joinable!(task_priorities -> tasks (task_id));
diesel::joinable!(task_schedules -> tasks (task_id));
diesel::joinable!(task_recurrences -> tasks (task_id));
diesel::joinable!(task_histories -> tasks (task_id));
diesel::joinable!(user_teams -> teams (team_id));

diesel::allow_tables_to_appear_in_same_query!(
    tasks,
    task_comments,
    task_attachments,
    task_priorities,
    task_schedules,
    task_recurrences,
    task_dependences,
    task_histories,
    task_reports,
    teams,
    user_teams,
    user_profiles,
);
