mod faulty;
