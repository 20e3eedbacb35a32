//! Machines wired up for the demo commands.
//!
//! Each builder runs inside the scheduler thread's init closure and returns
//! the Locations the demo edits or reads afterwards.

use automat_core::{Automat, GraphError, LocationId, Machine};
use automat_library::{
    Alert, AllTest, Blackboard, BlackboardUpdater, Button, ComboBox, Date, EqualityTest,
    ErrorReporter, HealthTest, Increment, Integer, LessThanTest, Parent, Switch, Text,
};

/// Counter: a button that counts its clicks.
#[derive(Clone, Copy, Debug)]
pub struct Counter {
    pub machine: LocationId,
    pub button: LocationId,
    pub count: LocationId,
}

/// Temperature converter: two texts kept consistent by a formula.
#[derive(Clone, Copy, Debug)]
pub struct Temperature {
    pub machine: LocationId,
    pub celsius: LocationId,
    pub fahrenheit: LocationId,
}

/// Flight booker: pick a flight type and dates, then book.
#[derive(Clone, Copy, Debug)]
pub struct FlightBooker {
    pub machine: LocationId,
    pub flight_type: LocationId,
    pub departure: LocationId,
    pub return_date: LocationId,
    pub book: LocationId,
    pub alert: LocationId,
}

fn machine(rt: &mut Automat, name: &str) -> Result<LocationId, GraphError> {
    let root = rt.root();
    rt.insert(root, Box::new(Machine::new(name)))?;
    Ok(root)
}

pub fn counter(rt: &mut Automat) -> Result<Counter, GraphError> {
    let root = machine(rt, "Counter")?;
    let value = rt.create(root, &Integer::default(), "Count value")?;
    let increment = rt.create(root, &Increment, "Increment action")?;
    rt.connect(increment, value, "target")?;
    let count = rt.create(root, &Text::default(), "Count")?;
    rt.connect(count, value, "target")?;
    let button = rt.create(root, &Button::new("Increment"), "Increment")?;
    rt.connect(button, increment, "then")?;
    rt.add_to_front_panel(root, count)?;
    rt.add_to_front_panel(root, button)?;
    Ok(Counter {
        machine: root,
        button,
        count,
    })
}

pub fn temperature(rt: &mut Automat) -> Result<Temperature, GraphError> {
    let root = machine(rt, "Temperature Converter")?;
    let celsius = rt.create(root, &Text::default(), "Celsius")?;
    let fahrenheit = rt.create(root, &Text::default(), "Fahrenheit")?;
    rt.add_to_front_panel(root, celsius)?;
    rt.add_to_front_panel(root, fahrenheit)?;
    let c = rt.create(root, &Integer::default(), "C")?;
    let f = rt.create(root, &Integer::default(), "F")?;
    rt.connect(celsius, c, "target")?;
    rt.connect(fahrenheit, f, "target")?;
    rt.create(root, &Blackboard::new("F = C * 9 / 5 + 32"), "Formula")?;
    rt.create(root, &BlackboardUpdater::default(), "Updater")?;
    Ok(Temperature {
        machine: root,
        celsius,
        fahrenheit,
    })
}

pub const ONE_WAY: &str = "one-way flight";
pub const RETURN: &str = "return flight";

pub fn flight_booker(rt: &mut Automat) -> Result<FlightBooker, GraphError> {
    let root = machine(rt, "Flight Booker")?;
    let flight_type = rt.create(root, &ComboBox::default(), "C")?;
    let departure = rt.create(root, &Text::default(), "T1")?;
    let return_date = rt.create(root, &Text::default(), "T2")?;
    let book = rt.create(root, &Button::new("Book"), "B")?;
    for id in [flight_type, departure, return_date, book] {
        rt.add_to_front_panel(root, id)?;
    }

    let one_way = rt.create(root, &Text::new(ONE_WAY), ONE_WAY)?;
    let return_flight = rt.create(root, &Text::new(RETURN), RETURN)?;
    rt.connect(flight_type, one_way, "option")?;
    rt.connect(flight_type, return_flight, "option")?;

    // The return date only matters for return flights.
    let return_enabled = rt.create(root, &EqualityTest::default(), "T2 enabled")?;
    rt.connect(return_enabled, flight_type, "target")?;
    rt.connect(return_enabled, return_flight, "target")?;
    rt.connect(return_date, return_enabled, "enabled")?;

    let parent = rt.create(root, &Parent, "Parent")?;
    let health = rt.create(root, &HealthTest::default(), "Health")?;
    rt.connect(health, parent, "target")?;
    rt.connect(book, health, "enabled")?;

    let departure_value = rt.create(root, &Date::default(), "T1")?;
    rt.connect(departure, departure_value, "target")?;
    let return_value = rt.create(root, &Date::default(), "T2")?;
    rt.connect(return_date, return_value, "target")?;

    let return_first = rt.create(root, &LessThanTest::default(), "T2 before T1")?;
    rt.connect(return_first, return_value, "less")?;
    rt.connect(return_first, departure_value, "than")?;
    let time_travel = rt.create(root, &AllTest::default(), "Time travel")?;
    rt.connect(time_travel, return_first, "test")?;
    rt.connect(time_travel, return_enabled, "test")?;

    let message = rt.create(
        root,
        &Text::new("Return flight date must be after departure date."),
        "Error message",
    )?;
    let reporter = rt.create(root, &ErrorReporter, "Error reporter")?;
    rt.connect(reporter, message, "message")?;
    rt.connect(reporter, time_travel, "test")?;
    rt.connect(reporter, return_date, "target")?;

    let alert = rt.create(root, &Alert::default(), "Alert")?;
    rt.connect(book, alert, "then")?;
    let switch = rt.create(root, &Switch::default(), "Switch")?;
    rt.connect(alert, switch, "message")?;
    rt.connect(switch, flight_type, "target")?;
    let one_way_message = rt.create(root, &Text::new("You have booked a one-way flight on {T1}."), "")?;
    rt.connect(switch, one_way_message, ONE_WAY)?;
    let return_message = rt.create(
        root,
        &Text::new("You have booked a return flight on {T1} and {T2}."),
        "",
    )?;
    rt.connect(switch, return_message, RETURN)?;

    Ok(FlightBooker {
        machine: root,
        flight_type,
        departure,
        return_date,
        book,
        alert,
    })
}

/// Texts of every error inside `machine`, sorted.
pub fn error_texts(rt: &Automat, machine: LocationId) -> Vec<String> {
    let mut texts: Vec<String> = rt
        .diagnostics(machine)
        .into_iter()
        .map(|(_, error)| error.text().to_string())
        .collect();
    texts.sort();
    texts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_counts() {
        let mut rt = Automat::new();
        let counter = counter(&mut rt).unwrap();
        rt.run_loop(None);
        rt.schedule_run(counter.button);
        rt.schedule_run(counter.button);
        rt.run_loop(None);
        assert_eq!(rt.text(counter.count), "2");
    }

    #[test]
    fn temperature_converts() {
        let mut rt = Automat::new();
        let temperature = temperature(&mut rt).unwrap();
        rt.run_loop(None);
        rt.set_text(temperature.celsius, "100");
        rt.run_loop(None);
        assert_eq!(rt.text(temperature.fahrenheit), "212");
        assert!(error_texts(&rt, temperature.machine).is_empty());
    }

    #[test]
    fn flight_books_one_way() {
        let mut rt = Automat::new();
        let booker = flight_booker(&mut rt).unwrap();
        rt.set_text(booker.flight_type, ONE_WAY);
        rt.set_text(booker.departure, "2024-01-02");
        rt.set_text(booker.return_date, "2024-01-02");
        rt.run_loop(None);
        rt.schedule_run(booker.book);
        rt.run_loop(None);
        assert_eq!(
            rt.object_as::<Alert>(booker.alert).unwrap().shown(),
            ["You have booked a one-way flight on 2024-01-02."]
        );
    }
}
