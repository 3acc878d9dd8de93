// Written by hand to match the hosted tables. `completed_tasks` holds a JSON array of task ids and
// `password` holds either a plain string or a JSON array of accepted answers.

diesel::table! {
    scoreboard (team) {
        team -> Text,
        score -> Integer,
        completed_tasks -> Nullable<Text>,
    }
}

diesel::table! {
    task (id) {
        id -> Integer,
        points -> Integer,
        password -> Nullable<Text>,
        active -> Nullable<Bool>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(scoreboard, task);
