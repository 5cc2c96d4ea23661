use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{NewTeam, Team, TeamMember, TeamWithMembers};
use crate::schema::{teams, users};

pub fn create_team(conn: &mut PgConnection, team_name: &str) -> QueryResult<()> {
    diesel::insert_into(teams::table)
        .values(&NewTeam {
            team_name: team_name.to_string(),
        })
        .execute(conn)?;
    Ok(())
}

pub fn team_exists(conn: &mut PgConnection, team_name: &str) -> QueryResult<bool> {
    diesel::select(exists(
        teams::table.filter(teams::team_name.eq(team_name)),
    ))
    .get_result(conn)
}

pub fn team_with_members(
    conn: &mut PgConnection,
    team_name: &str,
) -> QueryResult<Option<TeamWithMembers>> {
    let team: Option<Team> = teams::table.find(team_name).first(conn).optional()?;
    let Some(team) = team else {
        return Ok(None);
    };

    let members = members_of(conn, &team.team_name)?;
    Ok(Some(TeamWithMembers {
        team_name: team.team_name,
        created_at: team.created_at,
        members,
    }))
}

pub fn all_teams(conn: &mut PgConnection) -> QueryResult<Vec<TeamWithMembers>> {
    let rows: Vec<Team> = teams::table.order(teams::team_name.asc()).load(conn)?;

    let mut result = Vec::with_capacity(rows.len());
    for team in rows {
        let members = members_of(conn, &team.team_name)?;
        result.push(TeamWithMembers {
            team_name: team.team_name,
            created_at: team.created_at,
            members,
        });
    }
    Ok(result)
}

fn members_of(conn: &mut PgConnection, team_name: &str) -> QueryResult<Vec<TeamMember>> {
    users::table
        .filter(users::team_name.eq(team_name))
        .order(users::username.asc())
        .select((users::user_id, users::username, users::is_active))
        .load(conn)
}
