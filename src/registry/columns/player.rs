//! Player attributes read straight from the base table.

use crate::registry::{AttributeSelect, ColumnDefinition, DataType};

pub(super) fn columns() -> Vec<ColumnDefinition> {
    use AttributeSelect::{Column, Concat};

    vec![
        ColumnDefinition::attribute("player_name", "Name", Concat(&["fname", "lname"])),
        ColumnDefinition::attribute("first_name", "First Name", Column("fname")),
        ColumnDefinition::attribute("last_name", "Last Name", Column("lname")),
        ColumnDefinition::attribute("position", "Position", Column("pos")),
        ColumnDefinition::attribute("team", "Team", Column("current_nfl_team")),
        ColumnDefinition::attribute("birthdate", "Birthdate", Column("dob")),
        ColumnDefinition::attribute("height", "Height", Column("height"))
            .with_type(DataType::Integer),
        ColumnDefinition::attribute("weight", "Weight", Column("weight"))
            .with_type(DataType::Integer),
        ColumnDefinition::attribute("draft_year", "Draft Year", Column("nfl_draft_year"))
            .with_type(DataType::Integer),
        ColumnDefinition::attribute("draft_position", "Draft Position", Column("dpos"))
            .with_type(DataType::Integer),
        ColumnDefinition::attribute("college", "College", Column("col")),
    ]
}
