pub mod building {
    pub mod building;
    pub mod dispatch;
}

pub mod elevator {
    pub mod actor;
    pub mod fsm {
        pub mod door_timer;
        pub mod elevatorfsm;
        pub mod request_list;
    }
}

pub mod occupant {
    pub mod actor;
    pub mod occupant;
}

pub mod request;

pub mod util {
    pub mod config;
    pub mod constants;
    pub mod error;
    pub mod id;
}
