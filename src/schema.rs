diesel::table! {
    auth_tokens (id) {
        id -> Int8,
        #[max_length = 255]
        user_id -> Varchar,
        token -> Text,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    pr_reviewers (pull_request_id, user_id) {
        #[max_length = 255]
        pull_request_id -> Varchar,
        #[max_length = 255]
        user_id -> Varchar,
    }
}

diesel::table! {
    pull_requests (pull_request_id) {
        #[max_length = 255]
        pull_request_id -> Varchar,
        #[max_length = 500]
        pull_request_name -> Varchar,
        #[max_length = 255]
        author_id -> Varchar,
        #[max_length = 16]
        status -> Varchar,
        created_at -> Timestamptz,
        merged_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    teams (team_name) {
        #[max_length = 255]
        team_name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    users (user_id) {
        #[max_length = 255]
        user_id -> Varchar,
        #[max_length = 255]
        username -> Varchar,
        #[max_length = 255]
        team_name -> Varchar,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(auth_tokens -> users (user_id));
diesel::joinable!(pr_reviewers -> pull_requests (pull_request_id));
diesel::joinable!(pr_reviewers -> users (user_id));
diesel::joinable!(pull_requests -> users (author_id));
diesel::joinable!(users -> teams (team_name));

diesel::allow_tables_to_appear_in_same_query!(
    auth_tokens,
    pr_reviewers,
    pull_requests,
    teams,
    users,
);
